//! Fixed-column two-line element parsing.
//!
//! Lines must be exactly 69 characters with a valid modulo-10 checksum.
//! Catalog numbers accept the alpha-5 extension (`A0001` = 100001).

use super::OrbitalElementSet;
use crate::error::{Error, Result};
use hifitime::Epoch;

const LINE_LENGTH: usize = 69;

/// Modulo-10 checksum over the first 68 characters: digits count at face
/// value, minus signs count as one.
pub fn checksum(line: &str) -> u32 {
    line.chars()
        .take(LINE_LENGTH - 1)
        .map(|c| match c {
            '0'..='9' => c as u32 - '0' as u32,
            '-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

/// Parses a two-line element set.
pub fn parse_tle(line1: &str, line2: &str) -> Result<OrbitalElementSet> {
    let line1 = check_line(line1, '1')?;
    let line2 = check_line(line2, '2')?;

    let catalog_number = parse_catalog_number(&line1[2..7])?;
    if parse_catalog_number(&line2[2..7])? != catalog_number {
        return Err(Error::invalid_elements(format!(
            "catalog numbers differ between lines ({} vs {})",
            line1[2..7].trim(),
            line2[2..7].trim()
        )));
    }

    let two_digit_year: i32 = parse_field(&line1[18..20], "epoch year")?;
    let year = if two_digit_year < 57 {
        2000 + two_digit_year
    } else {
        1900 + two_digit_year
    };
    let day_of_year: f64 = parse_field(&line1[20..32], "epoch day")?;
    if !(1.0..367.0).contains(&day_of_year) {
        return Err(Error::invalid_elements(format!(
            "epoch day {day_of_year} out of range"
        )));
    }
    let year_start = Epoch::from_gregorian_utc_at_midnight(year, 1, 1).to_unix_seconds();
    let epoch = Epoch::from_unix_seconds(year_start + (day_of_year - 1.0) * 86_400.0);

    let elements = OrbitalElementSet {
        catalog_number,
        name: None,
        classification: line1[7..8].chars().next().unwrap_or('U'),
        international_designator: line1[9..17].trim().to_string(),
        epoch,
        mean_motion_dot: parse_field(&line1[33..43], "mean motion derivative")?,
        mean_motion_ddot: parse_assumed_decimal(&line1[44..52], "mean motion second derivative")?,
        bstar: parse_assumed_decimal(&line1[53..61], "drag term")?,
        element_set_number: parse_field_or_zero(&line1[64..68], "element set number")?,
        inclination_deg: parse_field(&line2[8..16], "inclination")?,
        raan_deg: parse_field(&line2[17..25], "right ascension of node")?,
        eccentricity: parse_field(&format!("0.{}", line2[26..33].trim()), "eccentricity")?,
        arg_perigee_deg: parse_field(&line2[34..42], "argument of perigee")?,
        mean_anomaly_deg: parse_field(&line2[43..51], "mean anomaly")?,
        mean_motion: parse_field(&line2[52..63], "mean motion")?,
        revolution_number: parse_field_or_zero(&line2[63..68], "revolution number")?,
    };
    validate(&elements)?;
    Ok(elements)
}

/// Parses a named element set (title line followed by two element lines).
pub fn parse_three_line(name: &str, line1: &str, line2: &str) -> Result<OrbitalElementSet> {
    let mut elements = parse_tle(line1, line2)?;
    let name = name.trim().trim_start_matches("0 ").trim();
    if !name.is_empty() {
        elements.name = Some(name.to_string());
    }
    Ok(elements)
}

/// Parses a block of element sets, with or without title lines.
pub fn parse_catalog(text: &str) -> Result<Vec<OrbitalElementSet>> {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty())
        .collect();

    let mut elements = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let is_element_line =
            |line: &str, number: char| line.len() == LINE_LENGTH && line.starts_with(number);
        if is_element_line(lines[i], '1') && i + 1 < lines.len() {
            elements.push(parse_tle(lines[i], lines[i + 1])?);
            i += 2;
        } else if i + 2 < lines.len() && is_element_line(lines[i + 1], '1') {
            elements.push(parse_three_line(lines[i], lines[i + 1], lines[i + 2])?);
            i += 3;
        } else {
            return Err(Error::invalid_elements(format!(
                "unexpected line {}: {:?}",
                i + 1,
                lines[i]
            )));
        }
    }
    Ok(elements)
}

fn check_line(line: &str, number: char) -> Result<&str> {
    let line = line.trim_end();
    if line.len() != LINE_LENGTH || !line.is_ascii() {
        return Err(Error::invalid_elements(format!(
            "line {number} must be {LINE_LENGTH} ASCII characters, got {}",
            line.len()
        )));
    }
    if !line.starts_with(number) || &line[1..2] != " " {
        return Err(Error::invalid_elements(format!(
            "expected line number {number}"
        )));
    }
    let expected = line[68..69]
        .parse::<u32>()
        .map_err(|_| Error::invalid_elements(format!("line {number} checksum is not a digit")))?;
    let actual = checksum(line);
    if expected != actual {
        return Err(Error::invalid_elements(format!(
            "line {number} checksum mismatch (expected {expected}, computed {actual})"
        )));
    }
    Ok(line)
}

fn parse_catalog_number(field: &str) -> Result<u32> {
    let field = field.trim();
    let mut chars = field.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            let digits: u32 = parse_field(chars.as_str(), "catalog number")?;
            Ok(alpha5_value(c.to_ascii_uppercase())? * 10_000 + digits)
        }
        _ => parse_field(field, "catalog number"),
    }
}

/// Alpha-5 leading letters, skipping I and O.
fn alpha5_value(letter: char) -> Result<u32> {
    let offset = match letter {
        'A'..='H' => letter as u32 - 'A' as u32,
        'J'..='N' => letter as u32 - 'A' as u32 - 1,
        'P'..='Z' => letter as u32 - 'A' as u32 - 2,
        _ => {
            return Err(Error::invalid_elements(format!(
                "invalid alpha-5 prefix {letter:?}"
            )))
        }
    };
    Ok(10 + offset)
}

fn parse_field<T: std::str::FromStr>(field: &str, what: &str) -> Result<T> {
    field
        .trim()
        .parse::<T>()
        .map_err(|_| Error::invalid_elements(format!("{what}: cannot parse {:?}", field.trim())))
}

fn parse_field_or_zero(field: &str, what: &str) -> Result<u32> {
    if field.trim().is_empty() {
        Ok(0)
    } else {
        parse_field(field, what)
    }
}

/// Fields such as ` 32729-3`, meaning 0.32729e-3.
fn parse_assumed_decimal(field: &str, what: &str) -> Result<f64> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(0.0);
    }
    let (sign, rest) = match field.as_bytes()[0] {
        b'-' => (-1.0, &field[1..]),
        b'+' => (1.0, &field[1..]),
        _ => (1.0, field),
    };
    let (mantissa, exponent) = match rest.rfind(['-', '+']) {
        Some(pos) if pos > 0 => (&rest[..pos], parse_field::<i32>(&rest[pos..], what)?),
        _ => (rest, 0),
    };
    let mantissa: f64 = parse_field(&format!("0.{}", mantissa.trim()), what)?;
    Ok(sign * mantissa * 10f64.powi(exponent))
}

fn validate(elements: &OrbitalElementSet) -> Result<()> {
    let angle_ok = |value: f64| (0.0..=360.0).contains(&value);
    if !(0.0..=180.0).contains(&elements.inclination_deg) {
        return Err(Error::invalid_elements(format!(
            "inclination {} outside [0, 180]",
            elements.inclination_deg
        )));
    }
    if !angle_ok(elements.raan_deg)
        || !angle_ok(elements.arg_perigee_deg)
        || !angle_ok(elements.mean_anomaly_deg)
    {
        return Err(Error::invalid_elements("angle outside [0, 360]"));
    }
    if !(0.0..1.0).contains(&elements.eccentricity) {
        return Err(Error::invalid_elements(format!(
            "eccentricity {} outside [0, 1)",
            elements.eccentricity
        )));
    }
    if !(elements.mean_motion.is_finite() && elements.mean_motion > 0.0) {
        return Err(Error::invalid_elements(format!(
            "mean motion {} must be positive",
            elements.mean_motion
        )));
    }
    if !elements.bstar.is_finite() {
        return Err(Error::invalid_elements("drag term is not finite"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    const ISS_1: &str = "1 25544U 98067A   23248.54842295  .00018164  00000-0  32729-3 0  9994";
    const ISS_2: &str = "2 25544  51.6416 357.6536 0005404 227.8174 205.8236 15.50066264424353";
    const VANGUARD_1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const VANGUARD_2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

    #[test_case(ISS_1, 4; "iss line 1")]
    #[test_case(ISS_2, 3; "iss line 2")]
    #[test_case(VANGUARD_1, 3; "vanguard line 1")]
    #[test_case(VANGUARD_2, 7; "vanguard line 2")]
    fn checksum_of_reference_lines(line: &str, expected: u32) {
        assert_eq!(checksum(line), expected);
    }

    #[test]
    fn parses_iss_fields() {
        let elements = parse_tle(ISS_1, ISS_2).unwrap();
        assert_eq!(elements.catalog_number, 25544);
        assert_eq!(elements.classification, 'U');
        assert_eq!(elements.international_designator, "98067A");
        assert_eq!(elements.element_set_number, 999);
        assert_eq!(elements.revolution_number, 42435);
        assert_abs_diff_eq!(elements.inclination_deg, 51.6416);
        assert_abs_diff_eq!(elements.raan_deg, 357.6536);
        assert_abs_diff_eq!(elements.eccentricity, 0.0005404, epsilon = 1e-12);
        assert_abs_diff_eq!(elements.mean_motion, 15.50066264);
        assert_abs_diff_eq!(elements.mean_motion_dot, 0.00018164);
        assert_abs_diff_eq!(elements.bstar, 0.32729e-3, epsilon = 1e-15);
        assert_abs_diff_eq!(elements.mean_motion_ddot, 0.0);
        assert_abs_diff_eq!(elements.epoch.to_unix_seconds(), 1_693_919_383.74288, epsilon = 1e-3);
    }

    #[test]
    fn epoch_before_2000() {
        let elements = parse_tle(VANGUARD_1, VANGUARD_2).unwrap();
        assert_abs_diff_eq!(elements.epoch.to_unix_seconds(), 962_131_819.733568, epsilon = 1e-3);
        assert_abs_diff_eq!(elements.bstar, 0.28098e-4, epsilon = 1e-15);
    }

    #[test]
    fn rejects_bad_checksum() {
        let corrupted = ISS_1.replace("9994", "9993");
        let err = parse_tle(&corrupted, ISS_2).unwrap_err();
        assert!(matches!(err, Error::InvalidElements { .. }));
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn rejects_swapped_lines() {
        assert!(matches!(
            parse_tle(ISS_2, ISS_1),
            Err(Error::InvalidElements { .. })
        ));
    }

    #[test]
    fn rejects_short_line() {
        assert!(matches!(
            parse_tle(&ISS_1[..60], ISS_2),
            Err(Error::InvalidElements { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_catalog_numbers() {
        assert!(matches!(
            parse_tle(VANGUARD_1, ISS_2),
            Err(Error::InvalidElements { .. })
        ));
    }

    #[test_case("25544", 25544; "numeric")]
    #[test_case("A0001", 100_001; "first alpha")]
    #[test_case("J2931", 182_931; "skips I")]
    #[test_case("P0000", 230_000; "skips O")]
    #[test_case("Z9999", 339_999; "last alpha")]
    fn catalog_numbers(field: &str, expected: u32) {
        assert_eq!(parse_catalog_number(field).unwrap(), expected);
    }

    #[test_case(" 32729-3", 0.32729e-3; "negative exponent")]
    #[test_case(" 00000-0", 0.0; "zero")]
    #[test_case("-11606-4", -0.11606e-4; "negative mantissa")]
    #[test_case(" 12345+1", 1.2345; "positive exponent")]
    fn assumed_decimal(field: &str, expected: f64) {
        assert_abs_diff_eq!(parse_assumed_decimal(field, "test").unwrap(), expected, epsilon = 1e-15);
    }

    #[test]
    fn catalog_with_and_without_titles() {
        let text = format!("ISS (ZARYA)\n{ISS_1}\n{ISS_2}\n\n{VANGUARD_1}\r\n{VANGUARD_2}\r\n");
        let elements = parse_catalog(&text).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].name.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(elements[1].name, None);
        assert_eq!(elements[1].catalog_number, 5);
    }

    #[test]
    fn catalog_rejects_garbage() {
        assert!(parse_catalog("No GP data found").is_err());
    }
}
