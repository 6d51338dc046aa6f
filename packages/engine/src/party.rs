//! Party (compareciente) schema and per-person derived records
//!
//! The party schema is externally fixed: the minuta form sends English
//! camelCase keys (`names`, `documentNumber`, `maritalStatus`) while the
//! matriz form sends Spanish ones (`nombres`, `cedula`, `estadoCivil`).
//! One struct accepts both dialects via serde aliases instead of
//! duplicating the schema.
//!
//! Derived records carry everything the templates interpolate for one
//! person: words forms of cédula/phone/age, the gendered honorific and
//! marital-status wording, the assembled address, and the
//! special-appearance flags used by the deed (interpreter, blind,
//! illiterate, intellectual disability, senior).

use crate::error::{GenerationError, Result};
use crate::transcribe;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A party appearing before the notary. Immutable input, supplied per
/// request; the engine never owns or persists it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default, alias = "nombres")]
    pub names: String,
    #[serde(default, alias = "apellidos")]
    pub last_names: String,
    #[serde(default, alias = "cedula")]
    pub document_number: String,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default, alias = "genero")]
    pub gender: Option<String>,
    #[serde(default, alias = "estadoCivil")]
    pub marital_status: Option<String>,
    #[serde(default)]
    pub partner_document_number: Option<String>,
    /// Full partner record when the form embeds one.
    #[serde(default, alias = "conyuge")]
    pub partner: Option<Box<Party>>,
    #[serde(default, alias = "nacionalidad")]
    pub nationality: Option<String>,
    #[serde(default, alias = "fechaNacimiento")]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    #[serde(default, alias = "provincia")]
    pub province: Option<String>,
    #[serde(default)]
    pub canton: Option<String>,
    #[serde(default)]
    pub parroquia: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default, alias = "callePrincipal")]
    pub main_street: Option<String>,
    #[serde(default, alias = "calleSecundaria")]
    pub secondary_street: Option<String>,
    #[serde(default, alias = "numeroCalle")]
    pub number_street: Option<String>,
    #[serde(default, alias = "ocupacion")]
    pub occupation: Option<String>,
    #[serde(default, alias = "profesion")]
    pub profession: Option<String>,

    // Special-appearance options; request-only, never persisted
    #[serde(default)]
    pub needs_interpreter: bool,
    #[serde(default)]
    pub nombre_interprete: Option<String>,
    #[serde(default)]
    pub genero_interprete: Option<String>,
    #[serde(default)]
    pub cedula_interprete: Option<String>,
    #[serde(default)]
    pub idioma_interprete: Option<String>,
    #[serde(default)]
    pub is_no_vidente: bool,
    #[serde(default)]
    pub persona_confianza_no_vidente: Option<String>,
    #[serde(default)]
    pub is_analfabeta: bool,
    #[serde(default)]
    pub persona_confianza_analfabeta: Option<String>,
    #[serde(default)]
    pub has_discapacidad_intelectual: bool,
    #[serde(default)]
    pub tipo_discapacidad: Option<String>,
    #[serde(default)]
    pub razon_exclusion_conyugue: Option<String>,
}

impl Party {
    /// Document number of the declared partner, from either the direct
    /// reference field or an embedded partner record.
    pub fn partner_ref(&self) -> Option<&str> {
        if let Some(doc) = self.partner_document_number.as_deref() {
            if !doc.is_empty() {
                return Some(doc);
            }
        }
        self.partner
            .as_deref()
            .map(|p| p.document_number.as_str())
            .filter(|d| !d.is_empty())
    }

    /// Full name in deed capitalization.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.names, self.last_names)
            .trim()
            .to_uppercase()
    }

    /// Parse the birth date when present.
    ///
    /// # Errors
    /// `InvalidField` when a birth date is present but not ISO formed;
    /// a malformed date must not silently become age zero.
    pub fn birth(&self) -> Result<Option<NaiveDate>> {
        let raw = match self.birth_date.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(r) => r,
        };
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| GenerationError::InvalidField {
                field: "birthDate".to_string(),
                reason: format!("'{raw}' is not a YYYY-MM-DD date"),
            })
    }

    /// Age in whole years at `today`. A missing birth date falls back to
    /// zero; a malformed one errors.
    pub fn age(&self, today: NaiveDate) -> Result<i64> {
        match self.birth()? {
            Some(birth) => Ok(transcribe::age_in_years(birth, today)),
            None => {
                tracing::warn!(
                    document = %self.document_number,
                    "Party has no birth date, using age 0"
                );
                Ok(0)
            }
        }
    }

    /// Deed honorific: "la señora" for femenino, "el señor" otherwise.
    pub fn honorific(&self) -> &'static str {
        if self.is_female() {
            "la señora"
        } else {
            "el señor"
        }
    }

    fn is_female(&self) -> bool {
        self.gender
            .as_deref()
            .is_some_and(|g| g.eq_ignore_ascii_case("femenino"))
    }

    /// Marital status word adjusted to the party's gender.
    pub fn marital_status_text(&self) -> String {
        let status = self
            .marital_status
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        if !self.is_female() {
            return status;
        }
        match status.as_str() {
            "casado" => "casada".to_string(),
            "soltero" => "soltera".to_string(),
            "divorciado" => "divorciada".to_string(),
            "viudo" => "viuda".to_string(),
            _ => status,
        }
    }

    /// "profesión X, ocupación Y" fragment, with either half alone when
    /// the other is absent.
    pub fn profession_occupation(&self) -> String {
        let profesion = self.profession.as_deref().unwrap_or_default().trim();
        let ocupacion = self.occupation.as_deref().unwrap_or_default().trim();
        match (profesion.is_empty(), ocupacion.is_empty()) {
            (false, false) => format!("profesión {profesion}, ocupación {ocupacion}"),
            (false, true) => format!("profesión {profesion}"),
            (true, false) => format!("ocupación {ocupacion}"),
            (true, true) => String::new(),
        }
    }

    /// Phone with spacing, plus signs and hyphens stripped.
    pub fn normalized_phone(&self) -> String {
        self.phone
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(|c| !matches!(c, '+' | ' ' | '-'))
            .collect()
    }

    /// Full address in the deed form, province included.
    pub fn deed_address(&self) -> String {
        let mut partes: Vec<String> = Vec::new();
        if let Some(calle) = non_empty(&self.main_street) {
            partes.push(calle.to_string());
        }
        if let Some(numero) = non_empty(&self.number_street) {
            partes.push(format!("número {numero}"));
        }
        if let Some(secundaria) = non_empty(&self.secondary_street) {
            partes.push(format!("y {secundaria}"));
        }
        if let Some(sector) = non_empty(&self.sector) {
            partes.push(format!("sector {sector}"));
        }
        if let Some(parroquia) = non_empty(&self.parroquia) {
            partes.push(format!("parroquia {parroquia}"));
        }
        if let Some(canton) = non_empty(&self.canton) {
            partes.push(format!("cantón {canton}"));
        }
        if let Some(provincia) = non_empty(&self.province) {
            partes.push(format!("provincia de {provincia}"));
        }
        partes.join(", ")
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Validate an Ecuadorian cédula: ten digits, province code 01-24,
/// mod-10 coefficient checksum on the first nine digits.
pub fn validate_cedula(cedula: &str) -> bool {
    if cedula.len() != 10 || !cedula.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u32> = cedula.chars().filter_map(|c| c.to_digit(10)).collect();

    let provincia = digits[0] * 10 + digits[1];
    if !(1..=24).contains(&provincia) {
        return false;
    }

    let coeficientes = [2, 1, 2, 1, 2, 1, 2, 1, 2];
    let suma: u32 = digits
        .iter()
        .take(9)
        .zip(coeficientes)
        .map(|(d, c)| {
            let valor = d * c;
            if valor >= 10 {
                valor - 9
            } else {
                valor
            }
        })
        .sum();

    let verificador = match suma % 10 {
        0 => 0,
        r => 10 - r,
    };
    verificador == digits[9]
}

/// Validate an Ecuadorian phone number: 9 or 10 digits once normalized.
pub fn validate_phone(phone: &str) -> bool {
    let normalized: String = phone
        .chars()
        .filter(|c| !matches!(c, '+' | ' ' | '-'))
        .collect();
    matches!(normalized.len(), 9 | 10) && normalized.chars().all(|c| c.is_ascii_digit())
}

/// One person's minuta record: correlative number in words, identity
/// fields and their words forms.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaData {
    pub numero: String,
    pub numero_numerico: i64,
    pub nombres_completos: String,
    pub nacionalidad: String,
    pub estado_civil: String,
    pub cedula: String,
    pub cedula_palabras: String,
    pub edad: String,
    pub edad_numeros: i64,
    pub profesion: String,
    pub ocupacion: String,
    pub telefono: String,
    pub telefono_palabras: String,
    pub email: String,
}

impl PersonaData {
    /// Build the minuta record for one party with its correlative number.
    pub fn build(party: &Party, numero: i64, today: NaiveDate) -> Result<Self> {
        if !party.document_number.is_empty() && !validate_cedula(&party.document_number) {
            tracing::warn!(
                document = %party.document_number,
                "Document number fails the cédula checksum"
            );
        }
        let edad_numeros = party.age(today)?;
        let telefono = party.phone.clone().unwrap_or_default();
        Ok(Self {
            numero: transcribe::to_words(numero)?,
            numero_numerico: numero,
            nombres_completos: party.full_name(),
            nacionalidad: party
                .nationality
                .clone()
                .unwrap_or_else(|| "ecuatoriana".to_string()),
            estado_civil: party.marital_status.clone().unwrap_or_default(),
            cedula: party.document_number.clone(),
            cedula_palabras: transcribe::to_digit_words(&party.document_number),
            edad: transcribe::to_words(edad_numeros)?,
            edad_numeros,
            profesion: party.profession.clone().unwrap_or_default(),
            ocupacion: party.occupation.clone().unwrap_or_default(),
            telefono,
            telefono_palabras: transcribe::to_digit_words(&party.normalized_phone()),
            email: party.email.clone().unwrap_or_default(),
        })
    }
}

/// One person's deed (matriz) record, including special-appearance flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparecienteData {
    pub numero: i64,
    pub articulo: String,
    pub nombres: String,
    pub apellidos: String,
    pub nombre_completo: String,
    pub nacionalidad: String,
    pub cedula: String,
    pub cedula_en_letras: String,
    pub cedula_en_digitos: String,
    pub edad: i64,
    pub edad_en_letras: String,
    pub genero: String,
    pub estado_civil: String,
    pub estado_civil_texto: String,
    pub profesion_ocupacion: String,
    pub telefono: String,
    pub telefono_en_letras: String,
    pub email: String,
    pub direccion: String,
    pub provincia: String,
    pub canton: String,
    pub parroquia: String,

    pub needs_interpreter: bool,
    pub nombre_interprete: String,
    pub genero_interprete: String,
    pub cedula_interprete: String,
    pub idioma_interprete: String,
    pub is_no_vidente: bool,
    pub persona_confianza_no_vidente: String,
    pub is_analfabeta: bool,
    pub persona_confianza_analfabeta: String,
    pub has_discapacidad_intelectual: bool,
    pub tipo_discapacidad: String,
    pub razon_exclusion_conyugue: String,

    pub es_tercera_edad: bool,
    pub es_casado: bool,
    pub tiene_conyuge: bool,
    pub conyuge: Option<Party>,
}

impl ComparecienteData {
    /// Build the deed record for one party with its correlative number.
    pub fn build(party: &Party, numero: i64, today: NaiveDate) -> Result<Self> {
        let edad = party.age(today)?;
        let genero = party.gender.clone().unwrap_or_default().to_lowercase();
        let estado_civil = party
            .marital_status
            .clone()
            .unwrap_or_default()
            .to_lowercase();
        let telefono_normalizado = party.normalized_phone();
        let telefono_en_letras = if telefono_normalizado.chars().all(|c| c.is_ascii_digit()) {
            transcribe::to_digit_words(&telefono_normalizado)
        } else {
            String::new()
        };
        let cedula_palabras = transcribe::to_digit_words(&party.document_number);

        Ok(Self {
            numero,
            articulo: party.honorific().to_string(),
            nombres: party.names.clone(),
            apellidos: party.last_names.clone(),
            nombre_completo: format!("{} {}", party.names, party.last_names)
                .trim()
                .to_string(),
            nacionalidad: party.nationality.clone().unwrap_or_default(),
            cedula: party.document_number.clone(),
            cedula_en_letras: cedula_palabras.clone(),
            cedula_en_digitos: cedula_palabras,
            edad,
            edad_en_letras: transcribe::to_words(edad)?,
            genero,
            estado_civil: estado_civil.clone(),
            estado_civil_texto: party.marital_status_text(),
            profesion_ocupacion: party.profession_occupation(),
            telefono: party.phone.clone().unwrap_or_default(),
            telefono_en_letras,
            email: party.email.clone().unwrap_or_default(),
            direccion: party.deed_address(),
            provincia: party.province.clone().unwrap_or_default(),
            canton: party.canton.clone().unwrap_or_default(),
            parroquia: party.parroquia.clone().unwrap_or_default(),

            needs_interpreter: party.needs_interpreter,
            nombre_interprete: party.nombre_interprete.clone().unwrap_or_default(),
            genero_interprete: party.genero_interprete.clone().unwrap_or_default(),
            cedula_interprete: party.cedula_interprete.clone().unwrap_or_default(),
            idioma_interprete: party.idioma_interprete.clone().unwrap_or_default(),
            is_no_vidente: party.is_no_vidente,
            persona_confianza_no_vidente: party
                .persona_confianza_no_vidente
                .clone()
                .unwrap_or_default(),
            is_analfabeta: party.is_analfabeta,
            persona_confianza_analfabeta: party
                .persona_confianza_analfabeta
                .clone()
                .unwrap_or_default(),
            has_discapacidad_intelectual: party.has_discapacidad_intelectual,
            tipo_discapacidad: party.tipo_discapacidad.clone().unwrap_or_default(),
            razon_exclusion_conyugue: party.razon_exclusion_conyugue.clone().unwrap_or_default(),

            es_tercera_edad: edad >= 65,
            es_casado: estado_civil == "casado",
            tiene_conyuge: party.partner.is_some(),
            conyuge: party.partner.as_deref().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn maria() -> Party {
        Party {
            names: "María José".to_string(),
            last_names: "Pérez Vaca".to_string(),
            document_number: "1710034065".to_string(),
            gender: Some("femenino".to_string()),
            marital_status: Some("casado".to_string()),
            nationality: Some("ecuatoriana".to_string()),
            birth_date: Some("1980-03-10".to_string()),
            phone: Some("+593 99-123-4567".to_string()),
            occupation: Some("comerciante".to_string()),
            profession: Some("ingeniera".to_string()),
            main_street: Some("Av. Amazonas".to_string()),
            number_street: Some("N24-660".to_string()),
            secondary_street: Some("Av. Colón".to_string()),
            canton: Some("Quito".to_string()),
            province: Some("Pichincha".to_string()),
            parroquia: Some("Iñaquito".to_string()),
            ..Party::default()
        }
    }

    mod wire_schema {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_minuta_dialect() {
            let party: Party = serde_json::from_value(serde_json::json!({
                "names": "Juan",
                "lastNames": "Paredes",
                "documentNumber": "1710034065",
                "maritalStatus": "soltero"
            }))
            .unwrap();
            assert_eq!(party.names, "Juan");
            assert_eq!(party.document_number, "1710034065");
        }

        #[test]
        fn test_matriz_dialect() {
            let party: Party = serde_json::from_value(serde_json::json!({
                "nombres": "Juan",
                "apellidos": "Paredes",
                "cedula": "1710034065",
                "estadoCivil": "casado",
                "genero": "masculino",
                "fechaNacimiento": "1950-01-01",
                "needsInterpreter": true
            }))
            .unwrap();
            assert_eq!(party.names, "Juan");
            assert_eq!(party.document_number, "1710034065");
            assert!(party.needs_interpreter);
        }

        #[test]
        fn test_partner_ref_from_embedded_record() {
            let party: Party = serde_json::from_value(serde_json::json!({
                "names": "Ana",
                "maritalStatus": "casado",
                "partner": { "documentNumber": "0912345678" }
            }))
            .unwrap();
            assert_eq!(party.partner_ref(), Some("0912345678"));
        }
    }

    mod derived_text {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_full_name_uppercased() {
            assert_eq!(maria().full_name(), "MARÍA JOSÉ PÉREZ VACA");
        }

        #[test]
        fn test_honorific_and_gendered_status() {
            let m = maria();
            assert_eq!(m.honorific(), "la señora");
            assert_eq!(m.marital_status_text(), "casada");

            let mut juan = maria();
            juan.gender = Some("masculino".to_string());
            assert_eq!(juan.honorific(), "el señor");
            assert_eq!(juan.marital_status_text(), "casado");
        }

        #[test]
        fn test_profession_occupation_fragment() {
            assert_eq!(
                maria().profession_occupation(),
                "profesión ingeniera, ocupación comerciante"
            );

            let mut solo_ocupacion = maria();
            solo_ocupacion.profession = None;
            assert_eq!(
                solo_ocupacion.profession_occupation(),
                "ocupación comerciante"
            );
        }

        #[test]
        fn test_deed_address() {
            assert_eq!(
                maria().deed_address(),
                "Av. Amazonas, número N24-660, y Av. Colón, parroquia Iñaquito, \
                 cantón Quito, provincia de Pichincha"
            );
        }

        #[test]
        fn test_normalized_phone() {
            assert_eq!(maria().normalized_phone(), "593991234567");
        }
    }

    mod ages {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_age_from_birth_date() {
            assert_eq!(maria().age(today()).unwrap(), 46);
        }

        #[test]
        fn test_missing_birth_date_falls_back_to_zero() {
            let mut party = maria();
            party.birth_date = None;
            assert_eq!(party.age(today()).unwrap(), 0);
        }

        #[test]
        fn test_malformed_birth_date_errors() {
            let mut party = maria();
            party.birth_date = Some("10/03/1980".to_string());
            assert!(party.age(today()).is_err());
        }
    }

    mod validation {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_valid_cedula() {
            assert!(validate_cedula("1710034065"));
        }

        #[test]
        fn test_altered_check_digit_fails() {
            assert!(!validate_cedula("1710034066"));
        }

        #[test]
        fn test_bad_province_code_fails() {
            assert!(!validate_cedula("9910034065"));
            assert!(!validate_cedula("0010034065"));
        }

        #[test]
        fn test_wrong_length_fails() {
            assert!(!validate_cedula("12345"));
            assert!(!validate_cedula(""));
        }

        #[test]
        fn test_phone_validation() {
            assert!(validate_phone("0991234567"));
            assert!(validate_phone("099-123-4567"));
            assert!(!validate_phone("12345"));
            assert!(!validate_phone("09912345ab"));
        }
    }

    mod records {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_persona_data() {
            let persona = PersonaData::build(&maria(), 1, today()).unwrap();
            assert_eq!(persona.numero, "uno");
            assert_eq!(persona.numero_numerico, 1);
            assert_eq!(persona.nombres_completos, "MARÍA JOSÉ PÉREZ VACA");
            assert_eq!(persona.edad, "cuarenta y seis");
            assert_eq!(persona.edad_numeros, 46);
            assert!(persona.cedula_palabras.starts_with("uno siete uno cero"));
        }

        #[test]
        fn test_compareciente_data() {
            let comp = ComparecienteData::build(&maria(), 3, today()).unwrap();
            assert_eq!(comp.numero, 3);
            assert_eq!(comp.articulo, "la señora");
            assert_eq!(comp.estado_civil_texto, "casada");
            assert_eq!(comp.edad_en_letras, "cuarenta y seis");
            assert!(!comp.es_tercera_edad);
            assert!(comp.es_casado);
        }

        #[test]
        fn test_senior_flag() {
            let mut party = maria();
            party.birth_date = Some("1950-01-01".to_string());
            let comp = ComparecienteData::build(&party, 1, today()).unwrap();
            assert_eq!(comp.edad, 76);
            assert!(comp.es_tercera_edad);
        }
    }
}
