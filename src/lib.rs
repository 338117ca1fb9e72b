//! Compilador para el lenguaje de configuración de firmware ESP32.
//!
//! # Front end
//! Cada programa deriva de un único archivo de código fuente con palabras
//! clave en portugués. Este archivo se somete primero a análisis léxico en
//! [`lex`], de lo cual se obtiene un flujo de tokens. El flujo de tokens se
//! dispone en un [`ast::Program`] por medio de análisis sintáctico en
//! [`parse`]. El árbol es validado por análisis semántico en [`semantic`],
//! el cual verifica declaraciones, tipos (ver [`infer`]) y el uso correcto
//! de pinos y canales PWM.
//!
//! # Back end
//! Un programa aceptado se traduce a C++ para el framework Arduino en
//! [`codegen`]. Los canales PWM no existen en el lenguaje fuente; se asignan
//! durante la generación de código en [`pwm`]. La compilación del `.cpp`
//! resultante y la biblioteca de Arduino quedan fuera de este compilador.

#[macro_use]
mod macros;

pub mod ast;
pub mod codegen;
pub mod error;
pub mod infer;
pub mod lex;
pub mod parse;
pub mod pwm;
pub mod semantic;
pub mod source;

use std::io::Write;

use error::CompileError;

/// Emisión de código.
///
/// Este módulo reexporta lo necesario para traducir un programa a C++.
pub mod target {
    pub use crate::codegen::{emit, generate};
    pub use crate::pwm::{ChannelBinding, PwmChannels};
}

/// Valida un programa y, solo si es aceptado, emite su código.
///
/// Nada se escribe a `output` si el análisis semántico falla.
pub fn compile<W: Write>(program: &ast::Program, output: &mut W) -> Result<(), CompileError> {
    program.analyze()?;
    codegen::emit(program, output)?;

    Ok(())
}
