//! Dump parser.
//!
//! Recognizes `INSERT INTO <table> [(<cols>)] VALUES (...), (...);` statements
//! in legacy dump text. Everything else (`SET`, `CREATE TABLE`, `LOCK TABLES`,
//! comments) is skipped. This is not an SQL grammar: values are limited to
//! integer, decimal, string, `NULL` and boolean literals. Charset introducers
//! (`_binary '..'`) are dropped, and hex literals (`0x1F`, `X'1F'`) from
//! `--hex-blob` dumps are decoded into text.

use std::path::Path;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use tracing::debug;

use crate::errors::{LoadError, ParseError};
use crate::models::SqlValue;

/// One `INSERT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRecord {
    /// Unqualified table name as written in the dump.
    pub table: String,
    /// Column list in statement order. Empty when the statement has none.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// Reads and parses a dump file.
///
/// Non-UTF-8 bytes are replaced rather than rejected; legacy dumps are not
/// reliably encoded.
pub async fn parse_sql_file(path: &Path) -> Result<Vec<InsertRecord>, LoadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);

    let records = parse_sql(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), records = records.len(), "Parsed dump file");
    Ok(records)
}

/// Parses dump text into its `INSERT` records, in file order.
pub fn parse_sql(input: &str) -> Result<Vec<InsertRecord>, ParseError> {
    Parser::new(input).parse()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    statement: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            statement: 0,
        }
    }

    fn parse(mut self) -> Result<Vec<InsertRecord>, ParseError> {
        let mut records = Vec::new();

        loop {
            self.skip_trivia();
            if self.peek().is_none() {
                break;
            }
            self.statement += 1;

            if self.peek() == Some(';') {
                self.bump();
                continue;
            }

            let keyword = self.word();
            if keyword.eq_ignore_ascii_case("INSERT") || keyword.eq_ignore_ascii_case("REPLACE") {
                records.push(self.insert()?);
            } else {
                self.skip_statement();
            }
        }

        Ok(records)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            statement: self.statement,
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Skips whitespace and `--`, `#` and `/* */` comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' || (c == '-' && self.peek_at(1) == Some('-')) {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if c == '/' && self.peek_at(1) == Some('*') {
                self.bump();
                self.bump();
                while let Some(c) = self.bump() {
                    if c == '*' && self.peek() == Some('/') {
                        self.bump();
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Skips to just past the next `;` that is not inside a quoted run.
    fn skip_statement(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ';' => {
                    self.bump();
                    return;
                }
                '\'' | '"' | '`' => {
                    self.bump();
                    self.skip_quoted(c);
                }
                '-' | '/' | '#' => {
                    let before = self.pos;
                    self.skip_trivia();
                    if self.pos == before {
                        self.bump();
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn skip_quoted(&mut self, quote: char) {
        while let Some(c) = self.bump() {
            if c == '\\' && quote != '`' {
                self.bump();
            } else if c == quote {
                if self.peek() == Some(quote) {
                    self.bump();
                } else {
                    return;
                }
            }
        }
    }

    /// Reads a bare word (keyword or unquoted identifier).
    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        word
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_trivia();
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected `{expected}`, found `{c}`"))),
            None => Err(self.error(format!("expected `{expected}`, found end of input"))),
        }
    }

    fn insert(&mut self) -> Result<InsertRecord, ParseError> {
        // Modifiers and the optional INTO keyword.
        loop {
            self.skip_trivia();
            let start = (self.pos, self.line);
            let word = self.word();
            match word.to_ascii_uppercase().as_str() {
                "LOW_PRIORITY" | "DELAYED" | "HIGH_PRIORITY" | "IGNORE" => continue,
                "INTO" => break,
                _ => {
                    (self.pos, self.line) = start;
                    break;
                }
            }
        }

        let table = self.table_name()?;

        self.skip_trivia();
        let columns = if self.peek() == Some('(') {
            self.column_list()?
        } else {
            Vec::new()
        };

        self.skip_trivia();
        let keyword = self.word();
        if !keyword.eq_ignore_ascii_case("VALUES") && !keyword.eq_ignore_ascii_case("VALUE") {
            return Err(self.error(format!(
                "expected VALUES after INSERT INTO {table}, found `{keyword}`"
            )));
        }

        let mut rows = Vec::new();
        loop {
            rows.push(self.tuple()?);
            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(';') => {
                    self.bump();
                    break;
                }
                None => break,
                Some(c) if c.is_alphabetic() => {
                    // ON DUPLICATE KEY UPDATE ...
                    self.skip_statement();
                    break;
                }
                Some(c) => {
                    return Err(self.error(format!("expected `,` or `;` after row, found `{c}`")))
                }
            }
        }

        Ok(InsertRecord {
            table,
            columns,
            rows,
        })
    }

    /// Reads a possibly schema-qualified table name and keeps its last segment.
    fn table_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.identifier()?;
        while self.peek() == Some('.') {
            self.bump();
            name = self.identifier()?;
        }
        Ok(name)
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        self.skip_trivia();
        match self.peek() {
            Some(quote @ ('`' | '"')) => {
                self.bump();
                let mut ident = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => {
                            if self.peek() == Some(quote) {
                                self.bump();
                                ident.push(quote);
                            } else {
                                break;
                            }
                        }
                        Some(c) => ident.push(c),
                        None => return Err(self.error("unterminated quoted identifier")),
                    }
                }
                Ok(ident)
            }
            _ => {
                let ident = self.word();
                if ident.is_empty() {
                    Err(self.error("expected identifier"))
                } else {
                    Ok(ident)
                }
            }
        }
    }

    fn column_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect('(')?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.identifier()?);
            self.skip_trivia();
            match self.bump() {
                Some(',') => continue,
                Some(')') => break,
                Some(c) => return Err(self.error(format!("unexpected `{c}` in column list"))),
                None => return Err(self.error("unterminated column list")),
            }
        }
        Ok(columns)
    }

    fn tuple(&mut self) -> Result<Vec<SqlValue>, ParseError> {
        self.expect('(')?;
        let mut values = Vec::new();

        self.skip_trivia();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(values);
        }

        loop {
            values.push(self.value()?);
            self.skip_trivia();
            match self.bump() {
                Some(',') => continue,
                Some(')') => break,
                Some(c) => return Err(self.error(format!("unexpected `{c}` in row"))),
                None => return Err(self.error("unterminated row")),
            }
        }
        Ok(values)
    }

    fn value(&mut self) -> Result<SqlValue, ParseError> {
        self.skip_trivia();
        match self.peek() {
            Some(quote @ ('\'' | '"')) => self.string(quote),
            Some('0') if matches!(self.peek_at(1), Some('x' | 'X')) => self.hex_number(),
            Some('x' | 'X') if self.peek_at(1) == Some('\'') => self.hex_string(),
            Some('_') => {
                // Charset introducer, e.g. `_binary` or `_utf8mb4`.
                self.word();
                self.value()
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() => {
                let word = self.word();
                match word.to_ascii_uppercase().as_str() {
                    "NULL" => Ok(SqlValue::Null),
                    "TRUE" => Ok(SqlValue::Integer(1)),
                    "FALSE" => Ok(SqlValue::Integer(0)),
                    _ => Err(self.error(format!("unsupported literal `{word}`"))),
                }
            }
            Some(c) => Err(self.error(format!("unexpected `{c}` where a value was expected"))),
            None => Err(self.error("unexpected end of input in row")),
        }
    }

    fn string(&mut self, quote: char) -> Result<SqlValue, ParseError> {
        let start_line = self.line;
        self.bump();
        let mut text = String::new();

        loop {
            match self.bump() {
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('b') => '\u{8}',
                        Some('Z') => '\u{1a}',
                        Some(c) => c,
                        None => break,
                    };
                    text.push(escaped);
                }
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.bump();
                        text.push(quote);
                    } else {
                        return Ok(SqlValue::Text(text));
                    }
                }
                Some(c) => text.push(c),
                None => break,
            }
        }

        Err(ParseError {
            statement: self.statement,
            line: start_line,
            message: "unterminated string literal".to_string(),
        })
    }

    /// `0x1F2A`
    fn hex_number(&mut self) -> Result<SqlValue, ParseError> {
        self.bump();
        self.bump();
        let mut digits = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_hexdigit) {
            digits.push(c);
            self.bump();
        }
        self.decode_hex(&digits)
    }

    /// `X'1F2A'`
    fn hex_string(&mut self) -> Result<SqlValue, ParseError> {
        self.bump();
        self.bump();
        let mut digits = String::new();
        loop {
            match self.bump() {
                Some('\'') => return self.decode_hex(&digits),
                Some(c) => digits.push(c),
                None => return Err(self.error("unterminated hex literal")),
            }
        }
    }

    fn decode_hex(&self, digits: &str) -> Result<SqlValue, ParseError> {
        if digits.is_empty() {
            return Err(self.error("empty hex literal"));
        }
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let bytes = (0..padded.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&padded[i..i + 2], 16))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| self.error(format!("invalid hex literal `{digits}`")))?;
        Ok(SqlValue::Text(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn number(&mut self) -> Result<SqlValue, ParseError> {
        let mut literal = String::new();
        while let Some(c) = self.peek() {
            let sign_allowed = literal.is_empty() || literal.ends_with(['e', 'E']);
            let accepted = c.is_ascii_digit()
                || matches!(c, '.' | 'e' | 'E')
                || (sign_allowed && matches!(c, '-' | '+'));
            if accepted {
                literal.push(c);
                self.bump();
            } else {
                break;
            }
        }

        let is_decimal = literal.contains(['.', 'e', 'E']);
        if !is_decimal {
            if let Ok(v) = literal.parse::<i64>() {
                return Ok(SqlValue::Integer(v));
            }
        }
        BigDecimal::from_str(&literal)
            .map(SqlValue::Decimal)
            .map_err(|_| self.error(format!("invalid number `{literal}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_values_in_column_order() {
        let sql = "INSERT INTO `cells` (`id`, `lac`, `azimuth`, `standard`, `notes`) VALUES \
                   (1, 100, 12.5, 'gsm', NULL),\n  (2, -3, 1e3, 'umts', null),\n\
                   (3, 0, 0.5, 'lte', 'x');";

        let records = parse_sql(sql).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.table, "cells");
        assert_eq!(record.columns, vec!["id", "lac", "azimuth", "standard", "notes"]);
        assert_eq!(record.rows.len(), 3);
        assert_eq!(
            record.rows[0],
            vec![
                SqlValue::Integer(1),
                SqlValue::Integer(100),
                SqlValue::Decimal(BigDecimal::from_str("12.5").unwrap()),
                SqlValue::Text("gsm".to_string()),
                SqlValue::Null,
            ]
        );
        assert_eq!(record.rows[1][1], SqlValue::Integer(-3));
        assert_eq!(
            record.rows[1][2],
            SqlValue::Decimal(BigDecimal::from_str("1e3").unwrap())
        );
        assert_eq!(record.rows[1][4], SqlValue::Null);
    }

    #[test]
    fn strings_keep_escaped_quotes_and_commas() {
        let sql = concat!(
            "INSERT INTO notes (id, body) VALUES ",
            r#"(1, 'it''s, fine'), (2, 'a \'b\', c\\d');"#,
        );

        let records = parse_sql(sql).unwrap();

        assert_eq!(records[0].rows[0][1], SqlValue::Text("it's, fine".to_string()));
        assert_eq!(records[0].rows[1][1], SqlValue::Text("a 'b', c\\d".to_string()));
    }

    #[test]
    fn each_insert_becomes_its_own_record() {
        let sql = "
            -- MySQL dump
            /*!40101 SET NAMES utf8 */;
            DROP TABLE IF EXISTS `regions`;
            CREATE TABLE `regions` (`id` int, `name` varchar(64));
            LOCK TABLES `regions` WRITE;
            INSERT INTO `regions` (`id`, `name`) VALUES (1, 'Mazowieckie');
            INSERT INTO `regions` VALUES (2, 'Pomorskie');
            UNLOCK TABLES;
        ";

        let records = parse_sql(sql).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].columns, vec!["id", "name"]);
        assert!(records[1].columns.is_empty());
        assert_eq!(records[1].rows[0][1], SqlValue::Text("Pomorskie".to_string()));
    }

    #[test]
    fn qualified_names_and_modifiers_are_accepted() {
        let sql = "insert ignore into legacy.`base_stations` (id) values (7)";

        let records = parse_sql(sql).unwrap();

        assert_eq!(records[0].table, "base_stations");
        assert_eq!(records[0].rows, vec![vec![SqlValue::Integer(7)]]);
    }

    #[test]
    fn semicolons_inside_skipped_statements_do_not_split_them() {
        let sql = "CREATE TABLE t (c varchar(3) DEFAULT ';');\nINSERT INTO t (c) VALUES ('x');";

        let records = parse_sql(sql).unwrap();

        assert_eq!(records.len(), 1);
    }

    #[test]
    fn malformed_statement_reports_its_location() {
        let sql = "INSERT INTO t (a) VALUES (1);\n\nINSERT INTO t (a) VALUES (2 3);";

        let err = parse_sql(sql).unwrap_err();

        assert_eq!(err.statement, 2);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn binary_introducers_and_hex_blobs_are_read_as_text() {
        let sql = "INSERT INTO t (a, b, c, d) VALUES \
                   (_binary 'raw', 0x4F4B, X'6869', _utf8mb4 0x41);";

        let records = parse_sql(sql).unwrap();

        assert_eq!(
            records[0].rows[0],
            vec![
                SqlValue::Text("raw".to_string()),
                SqlValue::Text("OK".to_string()),
                SqlValue::Text("hi".to_string()),
                SqlValue::Text("A".to_string()),
            ]
        );
    }

    #[test]
    fn unterminated_string_points_at_its_start() {
        let sql = "INSERT INTO t (a) VALUES\n('never closed);\n";

        let err = parse_sql(sql).unwrap_err();

        assert_eq!(err.line, 2);
        assert!(err.message.contains("unterminated"));
    }
}
