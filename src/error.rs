//! Reporte de errores.
//!
//! Los errores léxicos y sintácticos conocen su ubicación en el código
//! fuente y se muestran junto a la línea que los causó. Los errores
//! semánticos se refieren a variables del árbol, el cual no guarda
//! ubicaciones, por lo cual se muestran sin extracto.

use crate::{
    semantic::SemanticError,
    source::{Located, Location},
};

use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use thiserror::Error;

mod sealed {
    pub trait Sealed {}
}

/// Un error que puede formar parte de un reporte de [`Diagnostics`].
pub trait Diagnostic: sealed::Sealed {
    fn source(&self) -> &dyn Error;
    fn location(&self) -> Option<&Location>;
}

/// Falla de [`crate::compile()`].
#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error("I/O error")]
    Io(#[from] io::Error),
}

pub struct Diagnostics {
    kind: &'static str,
    errors: Vec<Box<dyn 'static + Diagnostic>>,
}

impl Diagnostics {
    pub fn kind(self, kind: &'static str) -> Self {
        Diagnostics { kind, ..self }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            kind: "error",
            errors: Default::default(),
        }
    }
}

impl<E: 'static + Diagnostic> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        Diagnostics {
            errors: vec![Box::new(error)],
            ..Default::default()
        }
    }
}

impl<E: 'static + Diagnostic> From<Vec<E>> for Diagnostics {
    fn from(errors: Vec<E>) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| {
                let error: Box<dyn Diagnostic> = Box::new(error);
                error
            })
            .collect();

        Diagnostics {
            errors,
            ..Default::default()
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, fmt)
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics { kind, errors } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", kind, error.source())?;
            if let Some(location) = error.location() {
                excerpt(fmt, location)?;
            }

            writeln!(fmt)?;
        }

        let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(
            fmt,
            "Build failed with {} {}",
            errors.len(),
            error_or_errors
        )
    }
}

/// Muestra las líneas que abarca una ubicación, subrayando el rango.
fn excerpt(fmt: &mut fmt::Formatter<'_>, location: &Location) -> fmt::Result {
    writeln!(fmt, " --> {}", location)?;

    let digits = location.end().line().to_string().chars().count();
    writeln!(fmt, "{:digits$} |", "", digits = digits)?;

    for line_number in location.start().line()..=location.end().line() {
        location.with_line(line_number, |line| {
            writeln!(fmt, "{:>digits$} | {}", line_number, line, digits = digits)
        })?
    }

    let (from, to) = (
        location.start().column(),
        location.end().column().saturating_sub(1).max(1),
    );

    let min = from.min(to);
    let max = from.max(to);

    let skip = (min - 1) as usize;
    let highlight = (max - min + 1) as usize;

    writeln!(
        fmt,
        "{:digits$} | {:skip$}{:^<highlight$}",
        "",
        "",
        "",
        digits = digits,
        skip = skip,
        highlight = highlight
    )
}

impl<E: Error> sealed::Sealed for Located<E> {}

impl<E: Error> Diagnostic for Located<E> {
    fn source(&self) -> &dyn Error {
        self.as_ref()
    }

    fn location(&self) -> Option<&Location> {
        Some(Located::location(self))
    }
}

impl sealed::Sealed for SemanticError {}

impl Diagnostic for SemanticError {
    fn source(&self) -> &dyn Error {
        self
    }

    fn location(&self) -> Option<&Location> {
        None
    }
}
