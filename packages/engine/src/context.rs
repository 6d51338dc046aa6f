//! Context assembly for minuta and matriz templates
//!
//! Consumes the externally fixed form payload, classifies its branches
//! into a typed model (property kind, narrative modes, price terms) and
//! assembles the full variable mapping the template renderer
//! interpolates. Field names on both sides are a stable contract: the
//! wire schema with the calling HTTP layer, the context keys with the
//! authored templates.
//!
//! # Branches
//!
//! - Property: horizontal (condominium units with alícuotas) vs. common
//!   (single shared description) vs. unspecified.
//! - Title history and horizontal declaration: manually drafted rich
//!   text vs. structured form records with aclaratoria chains.
//! - Contract subject: manual text vs. template-derived.
//! - Price: manual text vs. ordered payment tranches lettered A, B, C…
//!
//! Missing optional nested objects substitute empty-valued defaults;
//! missing required fields and malformed dates/numbers error.

use crate::clauses::{resolve_clauses, ClauseNode, RawClause};
use crate::config;
use crate::error::{GenerationError, Result};
use crate::grouping::{group_by_partnership, GroupKind};
use crate::party::{ComparecienteData, Party, PersonaData};
use crate::richtext::{normalize, NormalizeMode, NormalizedText};
use crate::transcribe;
use crate::types::{ActingUser, Numeric, RenderingContext, Value};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tranche letters; tranches beyond the tenth use numeric literals.
const LETRAS_PARTES: [&str; 10] = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];

// =============================================================================
// Wire schema (externally fixed field names)
// =============================================================================

/// Minuta generation payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinutaForm {
    #[serde(default)]
    pub vendedores: Vec<Party>,
    #[serde(default)]
    pub compradores: Vec<Party>,

    /// "horizontal" | "comun"; anything else is unspecified.
    #[serde(default)]
    pub tipo_propiedad: Option<String>,
    #[serde(default)]
    pub nombre_conjunto: Option<String>,
    #[serde(default)]
    pub predios: Vec<RawPredio>,
    #[serde(default)]
    pub bien_comun: Option<RawBienComun>,
    #[serde(default)]
    pub ubicacion: Option<RawUbicacion>,

    /// "redactar" (manual) | "formulario".
    #[serde(default)]
    pub modo_historia: Option<String>,
    #[serde(default)]
    pub historia_manual: Option<String>,
    #[serde(default)]
    pub historia_formulario: Option<RawHistoria>,

    #[serde(default)]
    pub modo_declaratoria: Option<String>,
    #[serde(default)]
    pub declaratoria_manual: Option<String>,
    #[serde(default)]
    pub declaratoria_formulario: Option<RawClause>,

    #[serde(default)]
    pub linderos_generales: Option<RawLinderos>,
    // The historical form key carries a typo ("tieneLInderos…"); both
    // spellings are accepted.
    #[serde(default, alias = "tieneLInderosEspecificos")]
    pub tiene_linderos_especificos: bool,
    #[serde(default)]
    pub linderos_especificos: Option<RawLinderos>,

    /// "manual" | "auto".
    #[serde(default)]
    pub modo_sujeto: Option<String>,
    #[serde(default)]
    pub sujeto_manual: Option<String>,

    /// "manual" | "formulario".
    #[serde(default)]
    pub modo_precio: Option<String>,
    #[serde(default)]
    pub precio_manual: Option<String>,
    #[serde(default)]
    pub precio_total: Option<Numeric>,
    #[serde(default)]
    pub partes_pago: Vec<RawPartePago>,

    #[serde(default)]
    pub hay_administrador: bool,
    #[serde(default)]
    pub abogado: Option<RawAbogado>,
}

/// One parcel of a horizontal-property development.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPredio {
    #[serde(default)]
    pub es_compuesto: bool,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub tipo_otro: Option<String>,
    #[serde(default)]
    pub numero: Option<Numeric>,
    #[serde(default)]
    pub inmuebles: Vec<RawInmueble>,
    #[serde(default)]
    pub alicuota_total: Option<Numeric>,
    #[serde(default)]
    pub alicuota_total_manual: Option<Numeric>,
    #[serde(default)]
    pub usar_alicuota_manual: bool,
}

/// One unit inside a parcel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInmueble {
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub tipo_otro: Option<String>,
    #[serde(default)]
    pub nivel: Option<String>,
    #[serde(default)]
    pub area_cubierta: Option<Numeric>,
    #[serde(default)]
    pub area_descubierta: Option<Numeric>,
    #[serde(default)]
    pub alicuota_parcial: Option<Numeric>,
}

/// Common-property description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBienComun {
    #[serde(default)]
    pub tipo_bien_comun: Option<String>,
    #[serde(default)]
    pub tipo_bien_comun_otro: Option<String>,
    #[serde(default)]
    pub superficie_bien_comun: Option<Numeric>,
    #[serde(default)]
    pub numero_predio: Option<String>,
    #[serde(default)]
    pub descripcion_bien_comun: Option<String>,
}

/// Where the property is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUbicacion {
    #[serde(default)]
    pub lote: Option<String>,
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub parroquia: Option<String>,
    #[serde(default)]
    pub canton: Option<String>,
    #[serde(default)]
    pub provincia: Option<String>,
}

/// Structured acquisition history: the base title record plus
/// succession-specific fields for the decedent (causante).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHistoria {
    #[serde(flatten)]
    pub clause: RawClause,
    #[serde(default)]
    pub tipo_sucesion: Option<String>,
    #[serde(default)]
    pub nombre_causante: Option<String>,
    #[serde(default)]
    pub causante_adquirido_de: Option<String>,
    #[serde(default)]
    pub causante_titulo: Option<String>,
    #[serde(default)]
    pub causante_titulo_otro: Option<String>,
    #[serde(default)]
    pub causante_fecha_otorgamiento: Option<String>,
    #[serde(default)]
    pub causante_numero_notaria: Option<String>,
    #[serde(default)]
    pub causante_canton_notaria: Option<String>,
    #[serde(default)]
    pub causante_notario: Option<String>,
    #[serde(default)]
    pub causante_fecha_inscripcion: Option<String>,
    #[serde(default)]
    pub causante_canton_inscripcion: Option<String>,
}

impl RawHistoria {
    /// The decedent's own title record, in the shared clause shape.
    fn causante_clause(&self) -> RawClause {
        RawClause {
            titulo: self.causante_titulo.clone(),
            titulo_otro: self.causante_titulo_otro.clone(),
            adquirido_de: self.causante_adquirido_de.clone(),
            fecha_otorgamiento: self.causante_fecha_otorgamiento.clone(),
            numero_notaria: self.causante_numero_notaria.clone(),
            canton_notaria: self.causante_canton_notaria.clone(),
            notario: self.causante_notario.clone(),
            fecha_inscripcion: self.causante_fecha_inscripcion.clone(),
            canton_inscripcion: self.causante_canton_inscripcion.clone(),
            aclaratorias: Vec::new(),
        }
    }
}

/// One boundary direction: a single segment object or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDireccion {
    Multiple(Vec<RawLindero>),
    Single(RawLindero),
}

impl RawDireccion {
    fn segments(&self) -> &[RawLindero] {
        match self {
            RawDireccion::Multiple(segments) => segments,
            RawDireccion::Single(segment) => std::slice::from_ref(segment),
        }
    }
}

/// One boundary segment: length in meters plus the adjoining party.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLindero {
    #[serde(default)]
    pub metros: Option<Numeric>,
    #[serde(default)]
    pub colindancia: Option<String>,
}

/// A boundary set. The general set uses the four cardinal directions;
/// the specific set adds above/below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLinderos {
    #[serde(default)]
    pub norte: Option<RawDireccion>,
    #[serde(default)]
    pub sur: Option<RawDireccion>,
    #[serde(default)]
    pub este: Option<RawDireccion>,
    #[serde(default)]
    pub oeste: Option<RawDireccion>,
    #[serde(default)]
    pub arriba: Option<RawDireccion>,
    #[serde(default)]
    pub abajo: Option<RawDireccion>,
    #[serde(default)]
    pub superficie: Option<Numeric>,
}

/// One payment tranche.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPartePago {
    #[serde(default)]
    pub monto: Option<Numeric>,
    /// "unico" | "cuotas".
    #[serde(default)]
    pub tipo_pago: Option<String>,
    #[serde(default)]
    pub medio_pago: Option<String>,
    #[serde(default)]
    pub tipo_cheque: Option<String>,
    #[serde(default)]
    pub momento_pago: Option<String>,
    #[serde(default)]
    pub momento_otro: Option<String>,
    #[serde(default)]
    pub numero_cuotas: Option<Numeric>,
    #[serde(default)]
    pub valor_cuota: Option<Numeric>,
    #[serde(default)]
    pub periodicidad: Option<String>,
    #[serde(default)]
    pub periodicidad_otra: Option<String>,
    #[serde(default)]
    pub es_credito_bancario: bool,
    #[serde(default)]
    pub nombre_banco: Option<String>,
    #[serde(default)]
    pub cuenta_destino: Option<String>,
}

/// Sponsoring lawyer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAbogado {
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub tipo_matricula: Option<String>,
    #[serde(default)]
    pub provincia: Option<String>,
    #[serde(default)]
    pub numero_matricula: Option<String>,
}

/// Matriz (deed) generation payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrizForm {
    #[serde(default)]
    pub numero_protocolo: Option<String>,
    #[serde(default)]
    pub tipo_contrato: Option<String>,
    #[serde(default)]
    pub cuantia: Option<Numeric>,
    /// Execution date (ISO); required, drives the notarial date line.
    #[serde(default)]
    pub fecha_actual: Option<String>,
    #[serde(default)]
    pub notario: Option<String>,
    #[serde(default)]
    pub titulo_notario: Option<String>,
    #[serde(default)]
    pub matrizador: Option<String>,

    #[serde(default)]
    pub vendedores_list: Vec<Party>,
    #[serde(default)]
    pub compradores_list: Vec<Party>,

    #[serde(default)]
    pub needs_concuerdo: bool,
    #[serde(default)]
    pub datos_concuerdo: Option<RawConcuerdo>,

    #[serde(default)]
    pub abogado_nombre: Option<String>,
    #[serde(default)]
    pub abogado_es_mujer: bool,
    #[serde(default)]
    pub abogado_numero_matricula: Option<String>,
    #[serde(default)]
    pub abogado_tipo_matricula: Option<String>,
    #[serde(default)]
    pub abogado_provincia: Option<String>,
    /// Rich-text minuta body embedded in the deed.
    #[serde(default)]
    pub abogado_texto: Option<String>,
}

/// Concuerdo (certified-copy) block, echoed to the template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConcuerdo {
    #[serde(default, alias = "numero_protocolo")]
    pub numero_protocolo: Option<String>,
    #[serde(default)]
    pub names: Option<String>,
    #[serde(default, alias = "last_names")]
    pub last_names: Option<String>,
    #[serde(default, alias = "document_number")]
    pub document_number: Option<String>,
    #[serde(default)]
    pub fecha: Option<String>,
}

// =============================================================================
// Typed branch model
// =============================================================================

/// Property classification.
#[derive(Debug)]
pub enum PropertyKind<'a> {
    Horizontal {
        nombre_conjunto: String,
        predios: &'a [RawPredio],
    },
    Common(Option<&'a RawBienComun>),
    Unspecified,
}

/// Manual-vs-form duality shared by history, declaration, subject and
/// price narratives.
#[derive(Debug)]
pub enum Narrative<'a, T> {
    Manual(&'a str),
    Form(Option<&'a T>),
}

impl MinutaForm {
    /// Classify the property branch.
    pub fn property_kind(&self) -> PropertyKind<'_> {
        match self.tipo_propiedad.as_deref().map(str::trim) {
            Some("horizontal") => PropertyKind::Horizontal {
                nombre_conjunto: self
                    .nombre_conjunto
                    .as_deref()
                    .unwrap_or_default()
                    .to_uppercase(),
                predios: &self.predios,
            },
            Some("comun") => PropertyKind::Common(self.bien_comun.as_ref()),
            _ => PropertyKind::Unspecified,
        }
    }

    /// Classify the acquisition-history branch.
    pub fn history(&self) -> Narrative<'_, RawHistoria> {
        if is_manual(&self.modo_historia, &["redactar", "manual"]) {
            Narrative::Manual(self.historia_manual.as_deref().unwrap_or_default())
        } else {
            Narrative::Form(self.historia_formulario.as_ref())
        }
    }

    /// Classify the horizontal-declaration branch.
    pub fn declaration(&self) -> Narrative<'_, RawClause> {
        if is_manual(&self.modo_declaratoria, &["redactar", "manual"]) {
            Narrative::Manual(self.declaratoria_manual.as_deref().unwrap_or_default())
        } else {
            Narrative::Form(self.declaratoria_formulario.as_ref())
        }
    }

    /// Whether the contract subject is manually drafted.
    pub fn subject_is_manual(&self) -> bool {
        is_manual(&self.modo_sujeto, &["manual"])
    }

    /// Whether the price clause is manually drafted. "formulario" (and
    /// its short form "form") is the default.
    pub fn price_is_manual(&self) -> bool {
        is_manual(&self.modo_precio, &["manual", "redactar"])
    }
}

fn is_manual(mode: &Option<String>, manual_tokens: &[&str]) -> bool {
    mode.as_deref()
        .map(str::trim)
        .is_some_and(|m| manual_tokens.iter().any(|t| m.eq_ignore_ascii_case(t)))
}

// =============================================================================
// Derived records (template-facing shapes)
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GrupoData {
    pub tipo: GroupKind,
    pub direccion: String,
    pub personas: Vec<PersonaData>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InmuebleData {
    pub tipo: String,
    pub tipo_otro: String,
    pub nivel: String,
    pub area_cubierta: String,
    pub area_cubierta_palabras: String,
    pub area_descubierta: String,
    pub area_descubierta_palabras: String,
    pub alicuota_parcial: String,
    pub alicuota_parcial_palabras: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PredioData {
    pub es_compuesto: bool,
    pub tipo: String,
    pub tipo_otro: String,
    pub numero: String,
    pub numero_palabras: String,
    pub inmuebles: Vec<InmuebleData>,
    pub alicuota_total: String,
    pub alicuota_total_palabras: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BienComunData {
    pub tipo: String,
    pub tipo_otro: String,
    pub superficie: String,
    pub superficie_palabras: String,
    pub numero_predio: String,
    pub descripcion: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UbicacionData {
    pub lote: String,
    pub numero: String,
    pub parroquia: String,
    pub canton: String,
    pub provincia: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoriaData {
    pub titulo: String,
    pub titulo_otro: String,
    pub tipo_sucesion: String,
    pub adquirido_de: String,
    pub fecha_otorgamiento: String,
    pub numero_notaria: String,
    pub notaria_ordinal: String,
    pub canton_notaria: String,
    pub notario: String,
    pub fecha_inscripcion: String,
    pub canton_inscripcion: String,
    pub mismo_canton: bool,

    pub es_sucesion: bool,
    pub nombre_causante: String,
    pub causante_adquirido_de: String,
    pub causante_titulo: String,
    pub causante_titulo_otro: String,
    pub causante_fecha_otorgamiento: String,
    pub causante_numero_notaria: String,
    pub causante_canton_notaria: String,
    pub causante_notario: String,
    pub causante_fecha_inscripcion: String,
    pub causante_canton_inscripcion: String,
    pub causante_mismo_canton: bool,

    pub aclaratorias: Vec<ClauseNode>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeclaratoriaData {
    pub fecha_otorgamiento: String,
    pub numero_notaria: String,
    pub notaria_ordinal: String,
    pub canton_notaria: String,
    pub notario: String,
    pub fecha_inscripcion: String,
    pub canton_inscripcion: String,
    pub mismo_canton: bool,
    pub aclaratorias: Vec<ClauseNode>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SegmentoData {
    pub metros: String,
    pub metros_palabras: String,
    pub colindancia: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinderosData {
    pub norte: Vec<SegmentoData>,
    pub sur: Vec<SegmentoData>,
    pub este: Vec<SegmentoData>,
    pub oeste: Vec<SegmentoData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arriba: Vec<SegmentoData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub abajo: Vec<SegmentoData>,
    pub superficie: String,
    pub superficie_palabras: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParteData {
    pub letra: String,
    pub monto: String,
    pub monto_palabras: String,
    pub tipo_pago: String,
    pub es_cuotas: bool,
    pub medio_pago: String,
    pub tipo_cheque: String,
    pub momento_pago: String,
    pub momento_otro: String,
    pub numero_cuotas: String,
    pub numero_cuotas_palabras: String,
    pub valor_cuota: String,
    pub valor_cuota_palabras: String,
    pub periodicidad: String,
    pub periodicidad_otra: String,
    pub es_credito: bool,
    pub nombre_banco: String,
    pub cuenta_destino: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PrecioData {
    pub total: String,
    pub total_palabras: String,
    pub partes: Vec<ParteData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AbogadoData {
    pub nombre: String,
    pub tipo_matricula: String,
    pub provincia: String,
    pub numero_matricula: String,
}

// =============================================================================
// Minuta assembly
// =============================================================================

/// Assemble the full minuta rendering context.
///
/// Pure with respect to its inputs; `today` is injected so age
/// computation stays deterministic and testable.
pub fn build_minuta_context(
    form: &MinutaForm,
    user: &ActingUser,
    today: NaiveDate,
) -> Result<RenderingContext> {
    tracing::debug!(
        user = %user.username,
        vendedores = form.vendedores.len(),
        compradores = form.compradores.len(),
        "Assembling minuta context"
    );
    check_party_count(&form.vendedores)?;
    check_party_count(&form.compradores)?;

    let mut ctx = RenderingContext::new();

    // Comparecientes: groups on each side, one correlative counter
    // across both sides, person counts per side.
    let mut contador: i64 = 1;
    let grupos_vendedores = build_grupos(&form.vendedores, &mut contador, today)?;
    let grupos_compradores = build_grupos(&form.compradores, &mut contador, today)?;
    ctx.set_record("grupos_vendedores", &grupos_vendedores)?;
    ctx.set("num_vendedores", form.vendedores.len());
    ctx.set_record("grupos_compradores", &grupos_compradores)?;
    ctx.set("num_compradores", form.compradores.len());

    // Property classification
    let kind = form.property_kind();
    let es_horizontal = matches!(kind, PropertyKind::Horizontal { .. });
    ctx.set(
        "tipo_propiedad",
        form.tipo_propiedad.clone().unwrap_or_default(),
    );
    ctx.set("es_horizontal", es_horizontal);
    ctx.set("es_comun", matches!(kind, PropertyKind::Common(_)));
    ctx.set(
        "nombre_conjunto",
        form.nombre_conjunto
            .clone()
            .unwrap_or_default()
            .to_uppercase(),
    );
    match kind {
        PropertyKind::Horizontal { predios, .. } => {
            let predios: Vec<PredioData> = predios
                .iter()
                .map(build_predio)
                .collect::<Result<Vec<_>>>()?;
            ctx.set_record("predios", &predios)?;
        }
        PropertyKind::Common(bien) => {
            let bien = bien.cloned().unwrap_or_default();
            ctx.set_record("bien_comun", &build_bien_comun(bien)?)?;
        }
        PropertyKind::Unspecified => {}
    }

    // Location
    let ubicacion = form.ubicacion.clone().unwrap_or_default();
    ctx.set_record(
        "ubicacion",
        &UbicacionData {
            lote: text(&ubicacion.lote),
            numero: text(&ubicacion.numero),
            parroquia: text(&ubicacion.parroquia),
            canton: text(&ubicacion.canton),
            provincia: text(&ubicacion.provincia),
        },
    )?;

    // Acquisition history
    match form.history() {
        Narrative::Manual(markup) => {
            ctx.set("historia_manual", true);
            set_rich_text(&mut ctx, "historia_texto", markup);
        }
        Narrative::Form(historia) => {
            ctx.set("historia_manual", false);
            let historia = historia.cloned().unwrap_or_default();
            ctx.set_record("historia", &build_historia(&historia)?)?;
        }
    }

    // Horizontal-property declaration (only meaningful for horizontal)
    if es_horizontal {
        match form.declaration() {
            Narrative::Manual(markup) => {
                ctx.set("declaratoria_manual", true);
                set_rich_text(&mut ctx, "declaratoria_texto", markup);
            }
            Narrative::Form(declaratoria) => {
                ctx.set("declaratoria_manual", false);
                let declaratoria = declaratoria.cloned().unwrap_or_default();
                ctx.set_record("declaratoria", &build_declaratoria(&declaratoria)?)?;
            }
        }
        ctx.set("hay_administrador", form.hay_administrador);
    }

    // Boundaries
    let generales = form.linderos_generales.clone().unwrap_or_default();
    ctx.set_record("linderos", &build_linderos(&generales, false)?)?;

    let especificos_activos = es_horizontal && form.tiene_linderos_especificos;
    ctx.set("tiene_linderos_especificos", form.tiene_linderos_especificos);
    if especificos_activos {
        let especificos = form.linderos_especificos.clone().unwrap_or_default();
        ctx.set_record("linderos_especificos", &build_linderos(&especificos, true)?)?;
    }

    // Contract subject
    if form.subject_is_manual() {
        ctx.set("sujeto_manual", true);
        set_rich_text(&mut ctx, "sujeto_texto", form.sujeto_manual.as_deref().unwrap_or_default());
    } else {
        // The template derives the subject text from the rest of the context
        ctx.set("sujeto_manual", false);
    }

    // Price and payment terms
    if form.price_is_manual() {
        ctx.set("precio_manual", true);
        set_rich_text(&mut ctx, "precio_texto", form.precio_manual.as_deref().unwrap_or_default());
    } else {
        ctx.set("precio_manual", false);
        ctx.set_record("precio", &build_precio(form)?)?;
    }

    // Sponsoring lawyer
    let abogado = form.abogado.clone().unwrap_or_default();
    ctx.set_record(
        "abogado",
        &AbogadoData {
            nombre: text(&abogado.nombre),
            tipo_matricula: abogado
                .tipo_matricula
                .clone()
                .unwrap_or_else(|| "cj".to_string()),
            provincia: text(&abogado.provincia),
            numero_matricula: text(&abogado.numero_matricula),
        },
    )?;

    Ok(ctx)
}

fn check_party_count(parties: &[Party]) -> Result<()> {
    if parties.len() > config::MAX_PARTIES {
        return Err(GenerationError::TooManyParties {
            max: config::MAX_PARTIES,
        });
    }
    Ok(())
}

fn build_grupos(
    parties: &[Party],
    contador: &mut i64,
    today: NaiveDate,
) -> Result<Vec<GrupoData>> {
    let mut grupos = Vec::new();
    for group in group_by_partnership(parties) {
        let mut personas = Vec::with_capacity(group.members.len());
        for member in &group.members {
            personas.push(PersonaData::build(member, *contador, today)?);
            *contador += 1;
        }
        grupos.push(GrupoData {
            tipo: group.kind,
            direccion: group.shared_address(),
            personas,
        });
    }
    Ok(grupos)
}

fn build_predio(predio: &RawPredio) -> Result<PredioData> {
    let alicuota = if predio.usar_alicuota_manual {
        &predio.alicuota_total_manual
    } else {
        &predio.alicuota_total
    };
    Ok(PredioData {
        es_compuesto: predio.es_compuesto,
        tipo: text(&predio.tipo),
        tipo_otro: text(&predio.tipo_otro),
        numero: numeric_text(&predio.numero),
        numero_palabras: numeric_words(&predio.numero, "predios.numero")?,
        inmuebles: predio
            .inmuebles
            .iter()
            .map(build_inmueble)
            .collect::<Result<Vec<_>>>()?,
        alicuota_total: numeric_text(alicuota),
        alicuota_total_palabras: numeric_words(alicuota, "predios.alicuotaTotal")?,
    })
}

fn build_inmueble(inmueble: &RawInmueble) -> Result<InmuebleData> {
    Ok(InmuebleData {
        tipo: text(&inmueble.tipo),
        tipo_otro: text(&inmueble.tipo_otro),
        nivel: text(&inmueble.nivel),
        area_cubierta: numeric_text(&inmueble.area_cubierta),
        area_cubierta_palabras: numeric_words(&inmueble.area_cubierta, "inmuebles.areaCubierta")?,
        area_descubierta: numeric_text(&inmueble.area_descubierta),
        area_descubierta_palabras: numeric_words(
            &inmueble.area_descubierta,
            "inmuebles.areaDescubierta",
        )?,
        alicuota_parcial: numeric_text(&inmueble.alicuota_parcial),
        alicuota_parcial_palabras: numeric_words(
            &inmueble.alicuota_parcial,
            "inmuebles.alicuotaParcial",
        )?,
    })
}

fn build_bien_comun(bien: RawBienComun) -> Result<BienComunData> {
    Ok(BienComunData {
        tipo: text(&bien.tipo_bien_comun),
        tipo_otro: text(&bien.tipo_bien_comun_otro),
        superficie: numeric_text(&bien.superficie_bien_comun),
        superficie_palabras: numeric_words(
            &bien.superficie_bien_comun,
            "bienComun.superficieBienComun",
        )?,
        numero_predio: text(&bien.numero_predio),
        descripcion: text(&bien.descripcion_bien_comun),
    })
}

fn build_historia(historia: &RawHistoria) -> Result<HistoriaData> {
    let resolved = resolve_clauses(std::slice::from_ref(&historia.clause))?;
    let base = resolved.into_iter().next().unwrap_or_else(empty_clause_node);

    let es_sucesion = base.titulo == "sucesion";
    let causante = resolve_clauses(&[historia.causante_clause()])?
        .into_iter()
        .next()
        .unwrap_or_else(empty_clause_node);

    Ok(HistoriaData {
        titulo: base.titulo,
        titulo_otro: base.titulo_otro,
        tipo_sucesion: text(&historia.tipo_sucesion),
        adquirido_de: base.adquirido_de,
        fecha_otorgamiento: base.fecha_otorgamiento,
        numero_notaria: base.numero_notaria,
        notaria_ordinal: base.notaria_ordinal,
        canton_notaria: base.canton_notaria,
        notario: base.notario,
        fecha_inscripcion: base.fecha_inscripcion,
        canton_inscripcion: base.canton_inscripcion,
        mismo_canton: base.mismo_canton,

        es_sucesion,
        nombre_causante: text(&historia.nombre_causante),
        causante_adquirido_de: causante.adquirido_de,
        causante_titulo: causante.titulo,
        causante_titulo_otro: causante.titulo_otro,
        causante_fecha_otorgamiento: causante.fecha_otorgamiento,
        causante_numero_notaria: causante.numero_notaria,
        causante_canton_notaria: causante.canton_notaria,
        causante_notario: causante.notario,
        causante_fecha_inscripcion: causante.fecha_inscripcion,
        causante_canton_inscripcion: causante.canton_inscripcion,
        causante_mismo_canton: causante.mismo_canton,

        aclaratorias: base.aclaratorias,
    })
}

fn build_declaratoria(declaratoria: &RawClause) -> Result<DeclaratoriaData> {
    let resolved = resolve_clauses(std::slice::from_ref(declaratoria))?;
    let base = resolved.into_iter().next().unwrap_or_else(empty_clause_node);
    Ok(DeclaratoriaData {
        fecha_otorgamiento: base.fecha_otorgamiento,
        numero_notaria: base.numero_notaria,
        notaria_ordinal: base.notaria_ordinal,
        canton_notaria: base.canton_notaria,
        notario: base.notario,
        fecha_inscripcion: base.fecha_inscripcion,
        canton_inscripcion: base.canton_inscripcion,
        mismo_canton: base.mismo_canton,
        aclaratorias: base.aclaratorias,
    })
}

fn empty_clause_node() -> ClauseNode {
    ClauseNode {
        titulo: String::new(),
        titulo_otro: String::new(),
        adquirido_de: String::new(),
        fecha_otorgamiento: String::new(),
        numero_notaria: String::new(),
        notaria_ordinal: String::new(),
        canton_notaria: String::new(),
        notario: String::new(),
        fecha_inscripcion: String::new(),
        canton_inscripcion: String::new(),
        mismo_canton: false,
        aclaratorias: Vec::new(),
    }
}

fn build_linderos(linderos: &RawLinderos, with_vertical: bool) -> Result<LinderosData> {
    Ok(LinderosData {
        norte: resolve_direction(&linderos.norte, "linderos.norte")?,
        sur: resolve_direction(&linderos.sur, "linderos.sur")?,
        este: resolve_direction(&linderos.este, "linderos.este")?,
        oeste: resolve_direction(&linderos.oeste, "linderos.oeste")?,
        arriba: if with_vertical {
            resolve_direction(&linderos.arriba, "linderos.arriba")?
        } else {
            Vec::new()
        },
        abajo: if with_vertical {
            resolve_direction(&linderos.abajo, "linderos.abajo")?
        } else {
            Vec::new()
        },
        superficie: numeric_text(&linderos.superficie),
        superficie_palabras: numeric_words(&linderos.superficie, "linderos.superficie")?,
    })
}

/// Resolve one direction's segments. A segment missing either its
/// length or its adjoining description is dropped; a boundary entry is
/// only emitted when both fields are populated.
fn resolve_direction(
    direction: &Option<RawDireccion>,
    field: &str,
) -> Result<Vec<SegmentoData>> {
    let Some(direction) = direction else {
        return Ok(Vec::new());
    };

    let mut segmentos = Vec::new();
    for segment in direction.segments() {
        let metros = numeric_text(&segment.metros);
        let colindancia = text(&segment.colindancia);
        if metros.is_empty() || colindancia.is_empty() {
            continue;
        }
        segmentos.push(SegmentoData {
            metros_palabras: numeric_words(&segment.metros, field)?,
            metros,
            colindancia,
        });
    }
    Ok(segmentos)
}

fn build_precio(form: &MinutaForm) -> Result<PrecioData> {
    let total = numeric_text(&form.precio_total);
    let total_palabras = numeric_words(&form.precio_total, "precioTotal")?.to_uppercase();

    let partes = form
        .partes_pago
        .iter()
        .enumerate()
        .map(|(idx, parte)| build_parte(idx, parte))
        .collect::<Result<Vec<_>>>()?;

    Ok(PrecioData {
        total,
        total_palabras,
        partes,
    })
}

fn build_parte(idx: usize, parte: &RawPartePago) -> Result<ParteData> {
    let letra = LETRAS_PARTES
        .get(idx)
        .map(|l| l.to_string())
        .unwrap_or_else(|| (idx + 1).to_string());
    let tipo_pago = parte
        .tipo_pago
        .clone()
        .unwrap_or_else(|| "unico".to_string());

    Ok(ParteData {
        letra,
        monto: numeric_text(&parte.monto),
        monto_palabras: numeric_words(&parte.monto, "partesPago.monto")?.to_uppercase(),
        es_cuotas: tipo_pago == "cuotas",
        tipo_pago,
        medio_pago: text(&parte.medio_pago),
        tipo_cheque: text(&parte.tipo_cheque),
        momento_pago: text(&parte.momento_pago),
        momento_otro: text(&parte.momento_otro),
        numero_cuotas: numeric_text(&parte.numero_cuotas),
        numero_cuotas_palabras: numeric_words(&parte.numero_cuotas, "partesPago.numeroCuotas")?,
        valor_cuota: numeric_text(&parte.valor_cuota),
        valor_cuota_palabras: numeric_words(&parte.valor_cuota, "partesPago.valorCuota")?
            .to_uppercase(),
        periodicidad: text(&parte.periodicidad),
        periodicidad_otra: text(&parte.periodicidad_otra),
        es_credito: parte.es_credito_bancario,
        nombre_banco: text(&parte.nombre_banco),
        cuenta_destino: text(&parte.cuenta_destino),
    })
}

// =============================================================================
// Matriz assembly
// =============================================================================

/// Assemble the full matriz (deed) rendering context.
pub fn build_matriz_context(
    form: &MatrizForm,
    user: &ActingUser,
    today: NaiveDate,
) -> Result<RenderingContext> {
    tracing::debug!(
        user = %user.username,
        protocolo = form.numero_protocolo.as_deref().unwrap_or(""),
        "Assembling matriz context"
    );
    check_party_count(&form.vendedores_list)?;
    check_party_count(&form.compradores_list)?;

    let fecha_actual = form
        .fecha_actual
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| GenerationError::MissingField("fechaActual".to_string()))?;

    let mut ctx = RenderingContext::new();

    ctx.set(
        "numeroProtocolo",
        form.numero_protocolo.clone().unwrap_or_default(),
    );
    ctx.set(
        "tipoContrato",
        form.tipo_contrato
            .clone()
            .unwrap_or_default()
            .to_uppercase(),
    );
    match &form.cuantia {
        Some(cuantia) => {
            ctx.set_record("cuantia", cuantia)?;
            ctx.set("cuantiaEnLetras", numeric_words(&form.cuantia, "cuantia")?);
        }
        None => {
            ctx.set("cuantia", "");
            ctx.set("cuantiaEnLetras", "");
        }
    }
    ctx.set("fechaActual", fecha_actual);
    ctx.set("fechaNotarial", transcribe::to_notarial_date(fecha_actual)?);
    ctx.set("notario", form.notario.clone().unwrap_or_default());
    ctx.set("tituloNotario", form.titulo_notario.clone().unwrap_or_default());
    ctx.set("matrizador", form.matrizador.clone().unwrap_or_default());

    // Participants; numbering continues from sellers into buyers
    let mut vendedores = Vec::with_capacity(form.vendedores_list.len());
    for (idx, party) in form.vendedores_list.iter().enumerate() {
        vendedores.push(ComparecienteData::build(party, idx as i64 + 1, today)?);
    }
    let desde = vendedores.len() as i64 + 1;
    let mut compradores = Vec::with_capacity(form.compradores_list.len());
    for (idx, party) in form.compradores_list.iter().enumerate() {
        compradores.push(ComparecienteData::build(party, desde + idx as i64, today)?);
    }

    let todos: Vec<&ComparecienteData> = vendedores.iter().chain(compradores.iter()).collect();
    ctx.set("hayTerceraEdad", todos.iter().any(|p| p.es_tercera_edad));
    ctx.set("hayInterprete", todos.iter().any(|p| p.needs_interpreter));
    ctx.set("hayNoVidente", todos.iter().any(|p| p.is_no_vidente));
    ctx.set("hayAnalfabeta", todos.iter().any(|p| p.is_analfabeta));
    ctx.set(
        "hayDiscapacidadIntelectual",
        todos.iter().any(|p| p.has_discapacidad_intelectual),
    );
    ctx.set_record("todosParticipantes", &todos)?;
    ctx.set("numVendedores", vendedores.len());
    ctx.set("numCompradores", compradores.len());
    ctx.set_record("vendedores", &vendedores)?;
    ctx.set_record("compradores", &compradores)?;

    // Concuerdo
    ctx.set("needsConcuerdo", form.needs_concuerdo);
    match &form.datos_concuerdo {
        Some(datos) => ctx.set_record("datosConcuerdo", datos)?,
        None => ctx.set("datosConcuerdo", Value::Null),
    }

    // Sponsoring lawyer and embedded minuta body
    ctx.set("abogadoNombre", form.abogado_nombre.clone().unwrap_or_default());
    ctx.set("abogadoEsMujer", form.abogado_es_mujer);
    ctx.set(
        "abogadoNumeroMatricula",
        form.abogado_numero_matricula.clone().unwrap_or_default(),
    );
    ctx.set(
        "abogadoTipoMatricula",
        form.abogado_tipo_matricula.clone().unwrap_or_default(),
    );
    ctx.set(
        "abogadoProvincia",
        form.abogado_provincia.clone().unwrap_or_default(),
    );
    set_rich_text(
        &mut ctx,
        "abogadoTexto",
        form.abogado_texto.as_deref().unwrap_or_default(),
    );

    Ok(ctx)
}

// =============================================================================
// Helpers
// =============================================================================

fn text(field: &Option<String>) -> String {
    field.as_deref().unwrap_or_default().trim().to_string()
}

fn numeric_text(field: &Option<Numeric>) -> String {
    field.as_ref().map(Numeric::as_text).unwrap_or_default()
}

/// Words form of an optional numeric field. Absence transcribes to an
/// empty string; a present but unparseable value errors, naming the
/// field.
fn numeric_words(field: &Option<Numeric>, name: &str) -> Result<String> {
    match field {
        None => Ok(String::new()),
        Some(n) if n.is_empty() => Ok(String::new()),
        Some(n) => {
            transcribe::decimal_to_words(&n.as_text()).map_err(|err| {
                GenerationError::InvalidField {
                    field: name.to_string(),
                    reason: err.to_string(),
                }
            })
        }
    }
}

/// Normalize clause markup into styled runs under `key`; empty markup
/// stores an empty string so the template slot collapses cleanly.
fn set_rich_text(ctx: &mut RenderingContext, key: &str, markup: &str) {
    match normalize(markup, NormalizeMode::StyledRuns) {
        NormalizedText::Runs(runs) if !runs.is_empty() => ctx.set(key, runs),
        _ => ctx.set(key, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn user() -> ActingUser {
        ActingUser {
            id: 7,
            username: "matrizador1".to_string(),
            role: "matrizador".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn seller() -> serde_json::Value {
        json!({
            "names": "Carlos", "lastNames": "Andrade",
            "documentNumber": "1710034065", "maritalStatus": "soltero",
            "gender": "masculino", "birthDate": "1970-05-01",
            "nationality": "ecuatoriana"
        })
    }

    fn buyer() -> serde_json::Value {
        json!({
            "names": "Lucía", "lastNames": "Mora",
            "documentNumber": "0926687856", "maritalStatus": "soltero",
            "gender": "femenino", "birthDate": "1985-11-20",
            "nationality": "ecuatoriana"
        })
    }

    fn minuta_form(mut payload: serde_json::Value) -> MinutaForm {
        let base = payload.as_object_mut().expect("object payload");
        base.entry("vendedores").or_insert_with(|| json!([seller()]));
        base.entry("compradores").or_insert_with(|| json!([buyer()]));
        serde_json::from_value(payload).expect("valid form")
    }

    mod groups_and_counts {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_single_seller_and_buyer() {
            let form = minuta_form(json!({}));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();

            assert_eq!(ctx.get("num_vendedores"), Some(&Value::Int(1)));
            assert_eq!(ctx.get("num_compradores"), Some(&Value::Int(1)));

            let grupos = ctx
                .get("grupos_vendedores")
                .and_then(Value::as_array)
                .unwrap();
            assert_eq!(grupos.len(), 1);
            let grupo = grupos[0].as_object().unwrap();
            assert_eq!(
                grupo.get("tipo"),
                Some(&Value::String("soltero".to_string()))
            );
        }

        #[test]
        fn test_correlative_numbering_spans_both_sides() {
            let form = minuta_form(json!({}));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();

            let compradores = ctx
                .get("grupos_compradores")
                .and_then(Value::as_array)
                .unwrap();
            let personas = compradores[0]
                .as_object()
                .and_then(|g| g.get("personas"))
                .and_then(Value::as_array)
                .unwrap();
            let persona = personas[0].as_object().unwrap();
            // Second person overall: "dos"
            assert_eq!(persona.get("numero"), Some(&Value::String("dos".to_string())));
            assert_eq!(persona.get("numero_numerico"), Some(&Value::Int(2)));
        }

        #[test]
        fn test_couple_groups_once() {
            let form = minuta_form(json!({
                "vendedores": [
                    {"names": "A", "lastNames": "X", "documentNumber": "111",
                     "maritalStatus": "casado", "partnerDocumentNumber": "222"},
                    {"names": "B", "lastNames": "Y", "documentNumber": "222",
                     "maritalStatus": "casado", "partnerDocumentNumber": "111"}
                ]
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();

            let grupos = ctx
                .get("grupos_vendedores")
                .and_then(Value::as_array)
                .unwrap();
            assert_eq!(grupos.len(), 1);
            assert_eq!(
                grupos[0].as_object().unwrap().get("tipo"),
                Some(&Value::String("conyuges".to_string()))
            );
            assert_eq!(ctx.get("num_vendedores"), Some(&Value::Int(2)));
        }
    }

    mod property_branches {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_horizontal_enumerates_predios() {
            let form = minuta_form(json!({
                "tipoPropiedad": "horizontal",
                "nombreConjunto": "Conjunto Jardines",
                "predios": [{
                    "tipo": "departamento",
                    "numero": "12",
                    "alicuotaTotal": "3.25",
                    "inmuebles": [{
                        "tipo": "departamento", "nivel": "2",
                        "areaCubierta": "95.4", "areaDescubierta": "12",
                        "alicuotaParcial": "2.15"
                    }]
                }]
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();

            assert_eq!(ctx.get("es_horizontal"), Some(&Value::Bool(true)));
            assert_eq!(ctx.get("es_comun"), Some(&Value::Bool(false)));
            assert_eq!(
                ctx.get("nombre_conjunto"),
                Some(&Value::String("CONJUNTO JARDINES".to_string()))
            );

            let predios = ctx.get("predios").and_then(Value::as_array).unwrap();
            let predio = predios[0].as_object().unwrap();
            assert_eq!(
                predio.get("alicuota_total_palabras"),
                Some(&Value::String("tres punto dos cinco".to_string()))
            );
            let inmuebles = predio.get("inmuebles").and_then(Value::as_array).unwrap();
            let inmueble = inmuebles[0].as_object().unwrap();
            assert_eq!(
                inmueble.get("area_cubierta_palabras"),
                Some(&Value::String("noventa y cinco punto cuatro".to_string()))
            );
        }

        #[test]
        fn test_manual_alicuota_overrides_computed() {
            let form = minuta_form(json!({
                "tipoPropiedad": "horizontal",
                "predios": [{
                    "alicuotaTotal": "3.25",
                    "alicuotaTotalManual": "4.5",
                    "usarAlicuotaManual": true
                }]
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();
            let predios = ctx.get("predios").and_then(Value::as_array).unwrap();
            assert_eq!(
                predios[0].as_object().unwrap().get("alicuota_total"),
                Some(&Value::String("4.5".to_string()))
            );
        }

        #[test]
        fn test_common_property() {
            let form = minuta_form(json!({
                "tipoPropiedad": "comun",
                "bienComun": {
                    "tipoBienComun": "lote",
                    "superficieBienComun": "250",
                    "numeroPredio": "556677",
                    "descripcionBienComun": "Lote esquinero"
                }
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();

            assert_eq!(ctx.get("es_comun"), Some(&Value::Bool(true)));
            let bien = ctx.get("bien_comun").and_then(Value::as_object).unwrap();
            assert_eq!(
                bien.get("superficie_palabras"),
                Some(&Value::String("doscientos cincuenta".to_string()))
            );
        }

        #[test]
        fn test_unspecified_property_sets_neither_flag() {
            let form = minuta_form(json!({}));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();
            assert_eq!(ctx.get("es_horizontal"), Some(&Value::Bool(false)));
            assert_eq!(ctx.get("es_comun"), Some(&Value::Bool(false)));
            assert!(ctx.get("predios").is_none());
            assert!(ctx.get("bien_comun").is_none());
        }
    }

    mod history_branches {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_manual_history_normalizes_markup() {
            let form = minuta_form(json!({
                "modoHistoria": "redactar",
                "historiaManual": "<p>Adquirido por <b>compraventa</b></p>"
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();

            assert_eq!(ctx.get("historia_manual"), Some(&Value::Bool(true)));
            let runs = ctx.get("historia_texto").and_then(Value::as_runs).unwrap();
            assert_eq!(runs[0].text, "Adquirido por ");
            assert!(runs[1].bold);
        }

        #[test]
        fn test_form_history_with_succession_and_aclaratorias() {
            let form = minuta_form(json!({
                "modoHistoria": "formulario",
                "historiaFormulario": {
                    "titulo": "sucesion",
                    "tipoSucesion": "intestada",
                    "adquiridoDe": "Herederos Pérez",
                    "fechaOtorgamiento": "2001-03-05",
                    "numeroNotaria": "3",
                    "cantonNotaria": "Quito",
                    "fechaInscripcion": "2001-07-10",
                    "cantonInscripcion": "quito",
                    "nombreCausante": "Rosa Pérez",
                    "causanteTitulo": "compraventa",
                    "causanteFechaOtorgamiento": "1975-01-20",
                    "causanteCantonNotaria": "Quito",
                    "causanteCantonInscripcion": "Rumiñahui",
                    "aclaratorias": [{
                        "titulo": "aclaratoria",
                        "fechaOtorgamiento": "2005-02-14",
                        "cantonNotaria": "Quito",
                        "cantonInscripcion": "Quito"
                    }]
                }
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();

            assert_eq!(ctx.get("historia_manual"), Some(&Value::Bool(false)));
            let historia = ctx.get("historia").and_then(Value::as_object).unwrap();
            assert_eq!(historia.get("es_sucesion"), Some(&Value::Bool(true)));
            assert_eq!(historia.get("mismo_canton"), Some(&Value::Bool(true)));
            assert_eq!(
                historia.get("causante_mismo_canton"),
                Some(&Value::Bool(false))
            );
            assert_eq!(
                historia.get("notaria_ordinal"),
                Some(&Value::String("Tercera".to_string()))
            );

            let aclaratorias = historia
                .get("aclaratorias")
                .and_then(Value::as_array)
                .unwrap();
            assert_eq!(aclaratorias.len(), 1);
            let hija = aclaratorias[0].as_object().unwrap();
            assert_eq!(
                hija.get("fecha_otorgamiento"),
                Some(&Value::String(
                    "catorce de febrero del año dos mil cinco".to_string()
                ))
            );
        }

        #[test]
        fn test_missing_form_history_defaults_empty() {
            let form = minuta_form(json!({ "modoHistoria": "formulario" }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();
            let historia = ctx.get("historia").and_then(Value::as_object).unwrap();
            assert_eq!(historia.get("es_sucesion"), Some(&Value::Bool(false)));
            assert_eq!(historia.get("titulo"), Some(&Value::String(String::new())));
        }

        #[test]
        fn test_declaration_only_for_horizontal() {
            let form = minuta_form(json!({
                "modoDeclaratoria": "formulario",
                "declaratoriaFormulario": { "cantonNotaria": "Quito" }
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();
            assert!(ctx.get("declaratoria").is_none());
            assert!(ctx.get("declaratoria_manual").is_none());

            let form = minuta_form(json!({
                "tipoPropiedad": "horizontal",
                "modoDeclaratoria": "formulario",
                "declaratoriaFormulario": {
                    "cantonNotaria": "Quito", "cantonInscripcion": "Quito"
                }
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();
            let declaratoria = ctx.get("declaratoria").and_then(Value::as_object).unwrap();
            assert_eq!(declaratoria.get("mismo_canton"), Some(&Value::Bool(true)));
        }
    }

    mod boundaries {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_incomplete_segment_is_dropped() {
            let form = minuta_form(json!({
                "linderosGenerales": {
                    "norte": { "metros": "10" },
                    "sur": { "metros": "20", "colindancia": "calle pública" }
                }
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();
            let linderos = ctx.get("linderos").and_then(Value::as_object).unwrap();

            let norte = linderos.get("norte").and_then(Value::as_array).unwrap();
            assert!(norte.is_empty());

            let sur = linderos.get("sur").and_then(Value::as_array).unwrap();
            assert_eq!(sur.len(), 1);
            assert_eq!(
                sur[0].as_object().unwrap().get("metros_palabras"),
                Some(&Value::String("veinte".to_string()))
            );
        }

        #[test]
        fn test_multiple_segments_per_direction() {
            let form = minuta_form(json!({
                "linderosGenerales": {
                    "este": [
                        { "metros": "12", "colindancia": "lote 4" },
                        { "metros": "8.5", "colindancia": "pasaje peatonal" }
                    ]
                }
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();
            let linderos = ctx.get("linderos").and_then(Value::as_object).unwrap();
            let este = linderos.get("este").and_then(Value::as_array).unwrap();
            assert_eq!(este.len(), 2);
            assert_eq!(
                este[1].as_object().unwrap().get("metros_palabras"),
                Some(&Value::String("ocho punto cinco".to_string()))
            );
        }

        #[test]
        fn test_vertical_directions_only_on_specific_set() {
            let form = minuta_form(json!({
                "tipoPropiedad": "horizontal",
                "tieneLinderosEspecificos": true,
                "linderosGenerales": {
                    "arriba": { "metros": "3", "colindancia": "losa" }
                },
                "linderosEspecificos": {
                    "arriba": { "metros": "3", "colindancia": "losa de cubierta" }
                }
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();

            // arriba/abajo are not part of the general set
            let generales = ctx.get("linderos").and_then(Value::as_object).unwrap();
            assert!(generales.get("arriba").is_none());

            let especificos = ctx
                .get("linderos_especificos")
                .and_then(Value::as_object)
                .unwrap();
            let arriba = especificos.get("arriba").and_then(Value::as_array).unwrap();
            assert_eq!(arriba.len(), 1);
        }

        #[test]
        fn test_typoed_wire_key_is_accepted() {
            let form: MinutaForm = serde_json::from_value(json!({
                "tieneLInderosEspecificos": true
            }))
            .unwrap();
            assert!(form.tiene_linderos_especificos);
        }
    }

    mod price_branches {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_form_price_with_tranches() {
            let form = minuta_form(json!({
                "modoPrecio": "formulario",
                "precioTotal": "85000",
                "partesPago": [
                    { "monto": "60000", "tipoPago": "unico", "medioPago": "cheque",
                      "tipoCheque": "certificado", "momentoPago": "firma" },
                    { "monto": "25000", "tipoPago": "cuotas", "numeroCuotas": "10",
                      "valorCuota": "2500", "periodicidad": "mensual",
                      "esCreditoBancario": true, "nombreBanco": "Banco del Pichincha",
                      "cuentaDestino": "2203344556" }
                ]
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();

            assert_eq!(ctx.get("precio_manual"), Some(&Value::Bool(false)));
            let precio = ctx.get("precio").and_then(Value::as_object).unwrap();
            assert_eq!(
                precio.get("total_palabras"),
                Some(&Value::String("OCHENTA Y CINCO MIL".to_string()))
            );

            let partes = precio.get("partes").and_then(Value::as_array).unwrap();
            assert_eq!(partes.len(), 2);

            let primera = partes[0].as_object().unwrap();
            assert_eq!(primera.get("letra"), Some(&Value::String("A".to_string())));
            assert_eq!(primera.get("es_cuotas"), Some(&Value::Bool(false)));

            let segunda = partes[1].as_object().unwrap();
            assert_eq!(segunda.get("letra"), Some(&Value::String("B".to_string())));
            assert_eq!(segunda.get("es_cuotas"), Some(&Value::Bool(true)));
            assert_eq!(segunda.get("es_credito"), Some(&Value::Bool(true)));
            assert_eq!(
                segunda.get("numero_cuotas_palabras"),
                Some(&Value::String("diez".to_string()))
            );
        }

        #[test]
        fn test_tranche_letters_fall_back_to_numbers() {
            let partes: Vec<serde_json::Value> = (0..12)
                .map(|i| json!({ "monto": format!("{}", 100 * (i + 1)) }))
                .collect();
            let form = minuta_form(json!({ "partesPago": partes }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();

            let precio = ctx.get("precio").and_then(Value::as_object).unwrap();
            let partes = precio.get("partes").and_then(Value::as_array).unwrap();
            assert_eq!(
                partes[9].as_object().unwrap().get("letra"),
                Some(&Value::String("J".to_string()))
            );
            assert_eq!(
                partes[10].as_object().unwrap().get("letra"),
                Some(&Value::String("11".to_string()))
            );
        }

        #[test]
        fn test_manual_price() {
            let form = minuta_form(json!({
                "modoPrecio": "manual",
                "precioManual": "<p>El precio pactado es de <b>USD 85.000</b></p>"
            }));
            let ctx = build_minuta_context(&form, &user(), today()).unwrap();
            assert_eq!(ctx.get("precio_manual"), Some(&Value::Bool(true)));
            assert!(ctx.get("precio").is_none());
            assert!(ctx.get("precio_texto").and_then(Value::as_runs).is_some());
        }

        #[test]
        fn test_unparseable_amount_names_the_field() {
            let form = minuta_form(json!({
                "precioTotal": "ochenta mil"
            }));
            let err = build_minuta_context(&form, &user(), today()).unwrap_err();
            match err {
                GenerationError::InvalidField { field, .. } => {
                    assert_eq!(field, "precioTotal")
                }
                other => panic!("expected InvalidField, got {other}"),
            }
        }
    }

    mod matriz {
        use super::*;
        use pretty_assertions::assert_eq;

        fn matriz_base() -> serde_json::Value {
            json!({
                "numeroProtocolo": "2026-0150",
                "tipoContrato": "compraventa",
                "cuantia": 85000,
                "fechaActual": "2026-01-28",
                "notario": "Dra. Cecilia Játiva",
                "tituloNotario": "Notaria Pública Suplente Vigésima Segunda del Cantón Quito",
                "matrizador": "matrizador1",
                "vendedoresList": [{
                    "nombres": "Carlos", "apellidos": "Andrade",
                    "cedula": "1710034065", "genero": "masculino",
                    "estadoCivil": "soltero", "fechaNacimiento": "1950-02-01",
                    "nacionalidad": "ecuatoriana"
                }],
                "compradoresList": [{
                    "nombres": "Lucía", "apellidos": "Mora",
                    "cedula": "0926687856", "genero": "femenino",
                    "estadoCivil": "soltero", "fechaNacimiento": "1985-11-20",
                    "nacionalidad": "ecuatoriana",
                    "needsInterpreter": true, "idiomaInterprete": "kichwa"
                }],
                "abogadoTexto": "<p>Cláusula <b>primera</b></p>"
            })
        }

        #[test]
        fn test_matriz_context() {
            let form: MatrizForm = serde_json::from_value(matriz_base()).unwrap();
            let ctx = build_matriz_context(&form, &user(), today()).unwrap();

            assert_eq!(
                ctx.get("tipoContrato"),
                Some(&Value::String("COMPRAVENTA".to_string()))
            );
            assert_eq!(
                ctx.get("fechaNotarial"),
                Some(&Value::String(
                    "miércoles veinte y ocho de enero del año dos mil veintiséis".to_string()
                ))
            );
            assert_eq!(
                ctx.get("cuantiaEnLetras"),
                Some(&Value::String("ochenta y cinco mil".to_string()))
            );
            assert_eq!(ctx.get("numVendedores"), Some(&Value::Int(1)));
            assert_eq!(ctx.get("numCompradores"), Some(&Value::Int(1)));

            // Seller born 1950 is a senior; buyer needs an interpreter
            assert_eq!(ctx.get("hayTerceraEdad"), Some(&Value::Bool(true)));
            assert_eq!(ctx.get("hayInterprete"), Some(&Value::Bool(true)));
            assert_eq!(ctx.get("hayNoVidente"), Some(&Value::Bool(false)));

            let compradores = ctx.get("compradores").and_then(Value::as_array).unwrap();
            let lucia = compradores[0].as_object().unwrap();
            assert_eq!(lucia.get("numero"), Some(&Value::Int(2)));
            assert_eq!(
                lucia.get("articulo"),
                Some(&Value::String("la señora".to_string()))
            );

            let runs = ctx.get("abogadoTexto").and_then(Value::as_runs).unwrap();
            assert_eq!(runs[0].text, "Cláusula ");
            assert!(runs[1].bold);
        }

        #[test]
        fn test_missing_execution_date_errors() {
            let mut payload = matriz_base();
            payload.as_object_mut().unwrap().remove("fechaActual");
            let form: MatrizForm = serde_json::from_value(payload).unwrap();

            assert!(matches!(
                build_matriz_context(&form, &user(), today()),
                Err(GenerationError::MissingField(field)) if field == "fechaActual"
            ));
        }

        #[test]
        fn test_empty_lawyer_text_collapses() {
            let mut payload = matriz_base();
            payload.as_object_mut().unwrap().remove("abogadoTexto");
            let form: MatrizForm = serde_json::from_value(payload).unwrap();
            let ctx = build_matriz_context(&form, &user(), today()).unwrap();
            assert_eq!(ctx.get("abogadoTexto"), Some(&Value::String(String::new())));
        }
    }
}
