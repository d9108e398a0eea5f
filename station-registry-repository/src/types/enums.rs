use std::fmt;

/// Radio access technology of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rat {
    Gsm,
    Umts,
    Cdma,
    Lte,
    Nr,
    Iot,
}

impl Rat {
    /// Every RAT in canonical order.
    pub const ALL: [Rat; 6] = [Rat::Gsm, Rat::Umts, Rat::Cdma, Rat::Lte, Rat::Nr, Rat::Iot];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rat::Gsm => "GSM",
            Rat::Umts => "UMTS",
            Rat::Cdma => "CDMA",
            Rat::Lte => "LTE",
            Rat::Nr => "NR",
            Rat::Iot => "IOT",
        }
    }
}

impl fmt::Display for Rat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Duplex scheme of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Duplex {
    Fdd,
    Tdd,
}

impl Duplex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Duplex::Fdd => "FDD",
            Duplex::Tdd => "TDD",
        }
    }
}

impl fmt::Display for Duplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational status of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationStatus {
    Active,
    Inactive,
    Planned,
    Dismantled,
    Unknown,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationStatus::Active => "active",
            StationStatus::Inactive => "inactive",
            StationStatus::Planned => "planned",
            StationStatus::Dismantled => "dismantled",
            StationStatus::Unknown => "unknown",
        }
    }
}

/// Moderation state of a station record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditStatus {
    Published,
    Pending,
    Rejected,
}

impl EditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditStatus::Published => "published",
            EditStatus::Pending => "pending",
            EditStatus::Rejected => "rejected",
        }
    }
}
