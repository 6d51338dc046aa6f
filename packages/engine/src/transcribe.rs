//! Spanish transcription of numbers, dates and identifiers
//!
//! Notarial documents state every figure twice: in digits and in words.
//! This module implements the Latin-American Spanish conventions used by
//! the office:
//! - **Cardinals** through "millones", with the irregular 16-19 forms and
//!   the fused 21-29 prefix ("veintidós") versus the 31+ conjunction
//!   ("treinta y uno").
//! - **Digit spelling** for identifiers (cédulas, phone numbers, street
//!   codes) where each character is read on its own.
//! - **Feminine ordinals** for notary office numbers ("Vigésima Segunda").
//! - **Dates** in the long notarial form (weekday + words) and the short
//!   form used inside title histories.
//!
//! Negative input and malformed dates fail; they are never silently
//! coerced or echoed back.

use crate::config;
use crate::error::{GenerationError, Result};
use chrono::{Datelike, NaiveDate, Weekday};

/// Cardinal words 0-19, including the irregular 16-19 forms.
const MENORES_VEINTE: [&str; 20] = [
    "cero",
    "uno",
    "dos",
    "tres",
    "cuatro",
    "cinco",
    "seis",
    "siete",
    "ocho",
    "nueve",
    "diez",
    "once",
    "doce",
    "trece",
    "catorce",
    "quince",
    "dieciséis",
    "diecisiete",
    "dieciocho",
    "diecinueve",
];

/// Fused forms 21-29. These carry their own accents (veintidós), which
/// naive "veinti" + unit concatenation would lose.
const VEINTIS: [&str; 9] = [
    "veintiuno",
    "veintidós",
    "veintitrés",
    "veinticuatro",
    "veinticinco",
    "veintiséis",
    "veintisiete",
    "veintiocho",
    "veintinueve",
];

/// Feminine ordinal units 1-9 (index 0 unused).
const ORDINAL_UNIDAD: [&str; 10] = [
    "", "Primera", "Segunda", "Tercera", "Cuarta", "Quinta", "Sexta", "Séptima", "Octava",
    "Novena",
];

const MESES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

fn decena_word(n: i64) -> &'static str {
    match n {
        20 => "veinte",
        30 => "treinta",
        40 => "cuarenta",
        50 => "cincuenta",
        60 => "sesenta",
        70 => "setenta",
        80 => "ochenta",
        _ => "noventa",
    }
}

fn centena_word(n: i64) -> &'static str {
    match n {
        200 => "doscientos",
        300 => "trescientos",
        400 => "cuatrocientos",
        500 => "quinientos",
        600 => "seiscientos",
        700 => "setecientos",
        800 => "ochocientos",
        _ => "novecientos",
    }
}

/// Compose the words for a validated non-negative integer.
fn int_words(n: i64) -> String {
    match n {
        0..=19 => MENORES_VEINTE[n as usize].to_string(),
        20 => "veinte".to_string(),
        21..=29 => VEINTIS[(n - 21) as usize].to_string(),
        30 | 40 | 50 | 60 | 70 | 80 | 90 => decena_word(n).to_string(),
        31..=99 => format!("{} y {}", decena_word(n / 10 * 10), int_words(n % 10)),
        100 => "cien".to_string(),
        101..=199 => format!("ciento {}", int_words(n - 100)),
        200..=999 => {
            let resto = n % 100;
            if resto == 0 {
                centena_word(n).to_string()
            } else {
                format!("{} {}", centena_word(n - resto), int_words(resto))
            }
        }
        1000..=1999 => {
            let resto = n - 1000;
            if resto == 0 {
                "mil".to_string()
            } else {
                format!("mil {}", int_words(resto))
            }
        }
        2000..=999_999 => {
            let miles = n / 1000;
            let resto = n % 1000;
            if resto == 0 {
                format!("{} mil", int_words(miles))
            } else {
                format!("{} mil {}", int_words(miles), int_words(resto))
            }
        }
        1_000_000..=1_999_999 => {
            let resto = n - 1_000_000;
            if resto == 0 {
                "un millón".to_string()
            } else {
                format!("un millón {}", int_words(resto))
            }
        }
        _ => {
            let millones = n / 1_000_000;
            let resto = n % 1_000_000;
            if resto == 0 {
                format!("{} millones", int_words(millones))
            } else {
                format!("{} millones {}", int_words(millones), int_words(resto))
            }
        }
    }
}

/// Transcribe a non-negative integer to Spanish words.
///
/// # Errors
/// * `NegativeNumber` for negative input (never coerced)
/// * `NumberTooLarge` beyond [`config::MAX_TRANSCRIBABLE`]
pub fn to_words(n: i64) -> Result<String> {
    if n < 0 {
        return Err(GenerationError::NegativeNumber(n));
    }
    if n > config::MAX_TRANSCRIBABLE {
        return Err(GenerationError::NumberTooLarge(n));
    }
    Ok(int_words(n))
}

/// Transcribe a numeric string, decimal or integer, to Spanish words.
///
/// Accepts `,` or `.` as the decimal separator. The fractional part is
/// read **digit by digit** ("12.05" -> "doce punto cero cinco"); reading
/// it as a compound number would misstate areas and alícuotas. An
/// all-zero fractional part collapses to the integer words.
pub fn decimal_to_words(s: &str) -> Result<String> {
    let normalized = s.trim().replace(',', ".");
    if normalized.is_empty() {
        return Err(GenerationError::UnparseableNumber(s.to_string()));
    }

    let (entero, fraccion) = match normalized.split_once('.') {
        Some((e, f)) => (e, f),
        None => (normalized.as_str(), ""),
    };

    let n: i64 = entero
        .parse()
        .map_err(|_| GenerationError::UnparseableNumber(s.to_string()))?;

    if fraccion.is_empty() || fraccion.chars().all(|c| c == '0') {
        return to_words(n);
    }
    if !fraccion.chars().all(|c| c.is_ascii_digit()) {
        return Err(GenerationError::UnparseableNumber(s.to_string()));
    }

    let digitos: Vec<&str> = fraccion
        .chars()
        .map(|c| MENORES_VEINTE[c.to_digit(10).unwrap_or(0) as usize])
        .collect();

    Ok(format!("{} punto {}", to_words(n)?, digitos.join(" ")))
}

/// Spell a string character by character.
///
/// Digits become words, `-` becomes "guión", letters pass through
/// uppercased; anything else is dropped. Used for cédulas, phone
/// numbers and compound house codes.
pub fn to_digit_words(s: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    for ch in s.trim().chars() {
        if let Some(d) = ch.to_digit(10) {
            words.push(MENORES_VEINTE[d as usize].to_string());
        } else if ch == '-' {
            words.push("guión".to_string());
        } else if ch.is_alphabetic() {
            words.push(ch.to_uppercase().to_string());
        }
    }
    words.join(" ")
}

/// Feminine ordinal for a notary office number.
///
/// 1-19 use the irregular forms ("Décimo Novena"), 20-99 compose decade
/// stem and unit ("Vigésima Segunda"). Offices above 99 do not exist in
/// practice, so anything outside 1-99 falls back to the literal
/// "Notaría No. N" label.
pub fn to_ordinal_feminine(n: i64) -> String {
    match n {
        1..=9 => ORDINAL_UNIDAD[n as usize].to_string(),
        10 => "Décima".to_string(),
        11..=19 => format!("Décimo {}", ORDINAL_UNIDAD[(n - 10) as usize]),
        20 | 30 | 40 | 50 | 60 | 70 | 80 | 90 => ordinal_decena(n / 10).to_string(),
        21..=99 => format!(
            "{} {}",
            ordinal_decena(n / 10),
            ORDINAL_UNIDAD[(n % 10) as usize]
        ),
        _ => format!("Notaría No. {n}"),
    }
}

fn ordinal_decena(decena: i64) -> &'static str {
    match decena {
        2 => "Vigésima",
        3 => "Trigésima",
        4 => "Cuadragésima",
        5 => "Quincuagésima",
        6 => "Sexagésima",
        7 => "Septuagésima",
        8 => "Octogésima",
        _ => "Nonagésima",
    }
}

/// Long notarial date: weekday, day in words, month, year in words.
///
/// The day keeps the open "veinte y ocho" convention used in deeds,
/// which differs deliberately from the fused cardinal form.
///
/// # Errors
/// `InvalidDate` when the input is not ISO `YYYY-MM-DD`.
pub fn to_notarial_date(iso: &str) -> Result<String> {
    let date = parse_iso(iso)?;
    Ok(format!(
        "{} {} de {} del año {}",
        weekday_name(date.weekday()),
        day_of_month_words(date.day()),
        MESES[(date.month() - 1) as usize],
        int_words(date.year() as i64),
    ))
}

/// Short date used inside title histories: day, month, year in words,
/// without the weekday. The day uses the fused cardinal ("veintiocho").
pub fn to_plain_date(iso: &str) -> Result<String> {
    let date = parse_iso(iso)?;
    Ok(format!(
        "{} de {} del año {}",
        int_words(date.day() as i64),
        MESES[(date.month() - 1) as usize],
        int_words(date.year() as i64),
    ))
}

fn parse_iso(iso: &str) -> Result<NaiveDate> {
    let trimmed = iso.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| GenerationError::InvalidDate(iso.to_string()))?;
    // %Y also accepts signed years, which have no words form
    if date.year() < 0 {
        return Err(GenerationError::InvalidDate(iso.to_string()));
    }
    Ok(date)
}

/// Day-of-month in the open deed form: "veinte y ocho", not "veintiocho".
fn day_of_month_words(d: u32) -> String {
    match d {
        1..=19 => MENORES_VEINTE[d as usize].to_string(),
        20 => "veinte".to_string(),
        21..=29 => format!("veinte y {}", MENORES_VEINTE[(d - 20) as usize]),
        30 => "treinta".to_string(),
        _ => "treinta y uno".to_string(),
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

/// Transcribe a compound house code like "E13-51" or "N24-660".
///
/// The numeric parts read as full numbers joined by "guión"; codes that
/// do not match the letter-number-hyphen-number shape fall back to
/// character-by-character spelling.
pub fn house_number_to_words(code: &str) -> String {
    let trimmed = code.trim();
    compound_code_words(trimmed).unwrap_or_else(|| to_digit_words(trimmed))
}

fn compound_code_words(code: &str) -> Option<String> {
    let (left, right) = code.split_once('-')?;

    let (letter, digits) = match left.chars().next() {
        Some(c) if c.is_alphabetic() => (Some(c), &left[c.len_utf8()..]),
        _ => (None, left),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if right.is_empty() || !right.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let first = to_words(digits.parse().ok()?).ok()?;
    let second = to_words(right.parse().ok()?).ok()?;

    Some(match letter {
        Some(c) => format!("{} {} guión {}", c.to_uppercase(), first, second),
        None => format!("{first} guión {second}"),
    })
}

/// Whole years elapsed between `birth` and `today`, decremented by one
/// when the current month/day precedes the birth month/day.
pub fn age_in_years(birth: NaiveDate, today: NaiveDate) -> i64 {
    let mut age = today.year() as i64 - birth.year() as i64;
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
