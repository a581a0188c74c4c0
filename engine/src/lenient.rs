//! Forgiving deserializers for numeric form fields.
//!
//! Hosts read values straight out of text inputs, so a number may arrive as
//! `12`, `"12"`, `""` or `null`. Anything that is not a finite number reads
//! as zero.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Num(f64),
    Text(String),
    Flag(bool),
    Null,
}

pub fn number<'de, D>(de: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Loose::deserialize(de)? {
        Loose::Num(v) => v,
        Loose::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Loose::Flag(b) => f64::from(u8::from(b)),
        Loose::Null => 0.0,
    };
    Ok(if value.is_finite() { value } else { 0.0 })
}

pub fn count<'de, D>(de: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = number(de)?;
    Ok(value.max(0.0).min(f64::from(u32::MAX)).floor() as u32)
}

pub fn small<'de, D>(de: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = number(de)?;
    Ok(value.max(0.0).min(f64::from(u8::MAX)).floor() as u8)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Field {
        #[serde(deserialize_with = "super::number")]
        value: f64,
        #[serde(deserialize_with = "super::count")]
        level: u32,
    }

    fn read(json: &str) -> Field {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_numbers_and_numeric_text() {
        let f = read(r#"{"value": "12.5", "level": 3}"#);
        assert_eq!(f.value, 12.5);
        assert_eq!(f.level, 3);
    }

    #[test]
    fn junk_reads_as_zero() {
        let f = read(r#"{"value": "abc", "level": null}"#);
        assert_eq!(f.value, 0.0);
        assert_eq!(f.level, 0);
        let f = read(r#"{"value": "", "level": "-4"}"#);
        assert_eq!(f.value, 0.0);
        assert_eq!(f.level, 0);
    }

    #[test]
    fn non_finite_text_reads_as_zero() {
        let f = read(r#"{"value": "inf", "level": "NaN"}"#);
        assert_eq!(f.value, 0.0);
        assert_eq!(f.level, 0);
    }
}
