//! Árbol sintáctico de un programa.
//!
//! Un programa consiste de declaraciones de variables globales, un bloque
//! `config` que se ejecuta una sola vez y un bloque `repita` que se ejecuta
//! indefinidamente. Las expresiones no se representan como árboles, sino
//! como el texto que finalmente se emite en C++; ver [`crate::infer`].

use std::fmt::{self, Display};

/// Tipo declarado de una variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarType {
    Integer,
    Text,
    Boolean,

    /// El tipo no pudo determinarse antes del análisis semántico.
    Undefined,
}

impl Display for VarType {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Integer => fmt.write_str("inteiro"),
            VarType::Text => fmt.write_str("texto"),
            VarType::Boolean => fmt.write_str("booleano"),
            VarType::Undefined => fmt.write_str("indefinido"),
        }
    }
}

/// Dirección de un pino digital.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PinDirection {
    /// `saida`
    Output,

    /// `entrada`
    Input,
}

impl PinDirection {
    /// Palabra con la que el lenguaje se refiere a esta dirección.
    pub fn keyword(self) -> &'static str {
        match self {
            PinDirection::Output => "saida",
            PinDirection::Input => "entrada",
        }
    }
}

impl Display for PinDirection {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.keyword())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub name: String,
    pub typ: VarType,
}

impl VariableDeclaration {
    pub fn new<S: Into<String>>(name: S, typ: VarType) -> Self {
        VariableDeclaration {
            name: name.into(),
            typ,
        }
    }
}

/// Un comando de cualquiera de los dos bloques.
///
/// Los campos de texto libre (`value`, `time`, `message`, etc.) contienen
/// expresiones ya renderizadas tal y como deben aparecer en la salida.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `target = value;`
    Assign { target: String, value: String },

    /// `configurar pin como saida;`
    ConfigurePin { pin: String, direction: PinDirection },

    /// `configurarPWM pin com frequencia 5000 resolucao 8;`
    ConfigurePwm {
        pin: String,
        frequency: i32,
        resolution: i32,
    },

    /// `ajustarPWM pin com valor value;`
    AdjustPwm { pin: String, value: String },

    /// `conectarWifi ssid password;`
    ConnectWifi { ssid: String, password: String },

    /// `esperar time;`
    Wait { time: String },

    /// `ligar pin;`
    TurnOn { pin: String },

    /// `desligar pin;`
    TurnOff { pin: String },

    /// `enviarHttp url data;`
    SendHttp { url: String, data: String },

    /// `configurarSerial baud;`
    ConfigureSerial { baud: i32 },

    /// `escreverSerial message;`
    WriteSerial { message: String },

    /// `lerSerial;`
    ReadSerial,

    /// `target = lerDigital pin;`
    ReadDigital { target: String, pin: String },

    /// `target = lerAnalogico pin;`
    ReadAnalog { target: String, pin: String },

    /// `se condition entao fim`, sin cuerpo
    Conditional { condition: String },

    /// `enquanto condition fim`, sin cuerpo
    WhileLoop { condition: String },

    Undefined,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub declarations: Vec<VariableDeclaration>,

    /// Bloque `config`, emitido como `setup()`.
    pub setup_commands: Vec<Command>,

    /// Bloque `repita`, emitido como `loop()`.
    pub loop_commands: Vec<Command>,
}

impl Program {
    /// Todos los comandos en orden de ejecución: primero `config`, luego `repita`.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.setup_commands.iter().chain(self.loop_commands.iter())
    }
}
