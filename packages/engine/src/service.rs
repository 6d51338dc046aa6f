//! Document generation service
//!
//! Orchestrates one generation end to end: assemble the rendering
//! context, hand it to the template-rendering collaborator, write the
//! resulting binary under the output directory, and return the audit
//! record for the persistence collaborator.
//!
//! The renderer is a trait seam: the engine never parses or lays out
//! documents itself. Filename uniqueness between concurrent writers
//! comes from the embedded timestamp; no coordination is needed.
//! A render failure propagates before anything touches disk, so no
//! partial documents are ever persisted.

use crate::context::{build_matriz_context, build_minuta_context, MatrizForm, MinutaForm};
use crate::error::{GenerationError, Result};
use crate::types::{ActingUser, RenderingContext};
use chrono::Local;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Template-rendering collaborator.
///
/// Implementations receive a template resource and the assembled
/// variable mapping and return the rendered binary. Leaf values include
/// plain strings and styled-run sequences.
pub trait TemplateRenderer {
    /// Render `template` with `context` into document bytes.
    ///
    /// # Errors
    /// `RenderFailed` with the engine's original message; the caller
    /// does not retry.
    fn render(&self, template: &Path, context: &RenderingContext) -> Result<Vec<u8>>;
}

/// Kind of notarial document to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Private preparatory sale contract.
    Minuta,
    /// Notarized deed (matriz).
    Matriz,
}

impl DocumentKind {
    /// Template file under the templates directory.
    pub fn template_file(&self) -> &'static str {
        match self {
            DocumentKind::Minuta => "minuta_compraventa.docx",
            DocumentKind::Matriz => "compraventa.docx",
        }
    }

    /// Output filename prefix.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Minuta => "minuta_compraventa",
            DocumentKind::Matriz => "matriz",
        }
    }
}

/// Audit row describing one generated document, handed to the
/// persistence collaborator.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub kind: DocumentKind,
    pub protocol_number: Option<String>,
    /// Username of the staff member who generated the document.
    pub generated_by: String,
    /// Where the rendered binary was written.
    pub path: PathBuf,
    /// SHA-256 of the rendered bytes.
    pub fingerprint: String,
}

/// One-stop generation facade over the context builders and the
/// renderer seam.
pub struct DocumentService<R> {
    templates_dir: PathBuf,
    output_dir: PathBuf,
    renderer: R,
}

impl<R: TemplateRenderer> DocumentService<R> {
    /// Create a service over a templates directory, an output directory
    /// and a renderer implementation.
    pub fn new(
        templates_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        renderer: R,
    ) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            output_dir: output_dir.into(),
            renderer,
        }
    }

    /// Generate a minuta de compraventa.
    pub fn generate_minuta(&self, form: &MinutaForm, user: &ActingUser) -> Result<DocumentRecord> {
        let today = Local::now().date_naive();
        let context = build_minuta_context(form, user, today)?;
        self.generate(DocumentKind::Minuta, &context, None, user)
    }

    /// Generate a matriz de compraventa.
    pub fn generate_matriz(&self, form: &MatrizForm, user: &ActingUser) -> Result<DocumentRecord> {
        let today = Local::now().date_naive();
        let context = build_matriz_context(form, user, today)?;
        self.generate(
            DocumentKind::Matriz,
            &context,
            form.numero_protocolo.as_deref(),
            user,
        )
    }

    /// Render a prepared context and persist the binary.
    fn generate(
        &self,
        kind: DocumentKind,
        context: &RenderingContext,
        protocol: Option<&str>,
        user: &ActingUser,
    ) -> Result<DocumentRecord> {
        let template = self.templates_dir.join(kind.template_file());
        if !template.is_file() {
            return Err(GenerationError::TemplateNotFound(
                template.display().to_string(),
            ));
        }

        let bytes = self.renderer.render(&template, context)?;

        fs::create_dir_all(&self.output_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = match (kind, protocol) {
            (DocumentKind::Matriz, protocol) => format!(
                "{}_{}_{}.docx",
                kind.file_prefix(),
                protocol.filter(|p| !p.is_empty()).unwrap_or("sin-protocolo"),
                timestamp
            ),
            (DocumentKind::Minuta, _) => {
                format!("{}_{}.docx", kind.file_prefix(), timestamp)
            }
        };
        let path = self.output_dir.join(filename);
        fs::write(&path, &bytes)?;

        let fingerprint = hex::encode(Sha256::digest(&bytes));
        tracing::debug!(
            path = %path.display(),
            user = %user.username,
            fingerprint = %fingerprint,
            "Document generated"
        );

        Ok(DocumentRecord {
            kind,
            protocol_number: protocol.map(String::from),
            generated_by: user.username.clone(),
            path,
            fingerprint,
        })
    }
}
