use std::fmt;

use station_registry_repository::types::Rat;

/// Steps of a migration run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationPhase {
    Start,
    Regions,
    Operators,
    Locations,
    Bands,
    Stations,
    CellsBase,
    CellsGsm,
    CellsUmts,
    CellsLte,
    CellsNr,
    Done,
    Error,
}

impl MigrationPhase {
    pub fn label(&self) -> &'static str {
        match self {
            MigrationPhase::Start => "start",
            MigrationPhase::Regions => "regions",
            MigrationPhase::Operators => "operators",
            MigrationPhase::Locations => "locations",
            MigrationPhase::Bands => "bands",
            MigrationPhase::Stations => "stations",
            MigrationPhase::CellsBase => "cells:base",
            MigrationPhase::CellsGsm => "cells:gsm",
            MigrationPhase::CellsUmts => "cells:umts",
            MigrationPhase::CellsLte => "cells:lte",
            MigrationPhase::CellsNr => "cells:nr",
            MigrationPhase::Done => "done",
            MigrationPhase::Error => "error",
        }
    }

    /// The phase after this one on the success path. Terminal phases stay put.
    pub fn next(&self) -> MigrationPhase {
        match self {
            MigrationPhase::Start => MigrationPhase::Regions,
            MigrationPhase::Regions => MigrationPhase::Operators,
            MigrationPhase::Operators => MigrationPhase::Locations,
            MigrationPhase::Locations => MigrationPhase::Bands,
            MigrationPhase::Bands => MigrationPhase::Stations,
            MigrationPhase::Stations => MigrationPhase::CellsBase,
            MigrationPhase::CellsBase => MigrationPhase::CellsGsm,
            MigrationPhase::CellsGsm => MigrationPhase::CellsUmts,
            MigrationPhase::CellsUmts => MigrationPhase::CellsLte,
            MigrationPhase::CellsLte => MigrationPhase::CellsNr,
            MigrationPhase::CellsNr => MigrationPhase::Done,
            MigrationPhase::Done => MigrationPhase::Done,
            MigrationPhase::Error => MigrationPhase::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MigrationPhase::Done | MigrationPhase::Error)
    }

    /// RAT whose detail rows this sub-phase writes.
    pub fn detail_rat(&self) -> Option<Rat> {
        match self {
            MigrationPhase::CellsGsm => Some(Rat::Gsm),
            MigrationPhase::CellsUmts => Some(Rat::Umts),
            MigrationPhase::CellsLte => Some(Rat::Lte),
            MigrationPhase::CellsNr => Some(Rat::Nr),
            _ => None,
        }
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
