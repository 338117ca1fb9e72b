//! Análisis semántico.
//!
//! El análisis ocurre en dos pasadas. La primera registra cada declaración
//! en una [`SymbolTable`] nueva. La segunda recorre los comandos de `config`
//! y luego los de `repita`, verificando que cada variable exista y que los
//! pinos se usen de forma consistente con la manera en que se configuraron.
//! Configurar un pino o un canal PWM modifica la tabla, por lo cual el orden
//! de los comandos importa.
//!
//! El análisis se detiene en el primer error encontrado.

use bitflags::bitflags;
use thiserror::Error;

use std::collections::HashMap;

use crate::{
    ast::{Command, PinDirection, Program, VarType, VariableDeclaration},
    infer,
};

bitflags! {
    /// Roles de hardware que ha adquirido una variable.
    pub struct Roles: u8 {
        /// Configurada como pino digital con `configurar`.
        const PIN = 0x01;

        /// Configurada como salida PWM con `configurarPWM`.
        const PWM = 0x02;
    }
}

/// Dirección con la que se configuró un pino, si es que se configuró.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PinMode {
    Unset,
    Output,
    Input,
}

impl From<PinDirection> for PinMode {
    fn from(direction: PinDirection) -> Self {
        match direction {
            PinDirection::Output => PinMode::Output,
            PinDirection::Input => PinMode::Input,
        }
    }
}

/// Estado de una variable durante el análisis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SymbolInfo {
    typ: VarType,
    roles: Roles,
    mode: PinMode,
}

impl SymbolInfo {
    fn new(typ: VarType) -> Self {
        SymbolInfo {
            typ,
            roles: Roles::empty(),
            mode: PinMode::Unset,
        }
    }

    pub fn typ(&self) -> VarType {
        self.typ
    }

    pub fn roles(&self) -> Roles {
        self.roles
    }

    pub fn pin_mode(&self) -> PinMode {
        self.mode
    }

    pub fn is_pin(&self) -> bool {
        self.roles.contains(Roles::PIN)
    }

    pub fn is_pwm(&self) -> bool {
        self.roles.contains(Roles::PWM)
    }
}

/// Tabla de símbolos de una única compilación.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Construye una tabla a partir de las declaraciones de un programa.
    pub fn from_declarations(declarations: &[VariableDeclaration]) -> Semantic<Self> {
        let mut table = SymbolTable::new();
        for declaration in declarations {
            table.declare(declaration)?;
        }

        Ok(table)
    }

    /// Registra una declaración, fallando si el nombre ya existía.
    pub fn declare(&mut self, declaration: &VariableDeclaration) -> Semantic<()> {
        if self.symbols.contains_key(&declaration.name) {
            return Err(SemanticError::DuplicateDeclaration(
                declaration.name.clone(),
            ));
        }

        self.symbols
            .insert(declaration.name.clone(), SymbolInfo::new(declaration.typ));

        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Semantic<&SymbolInfo> {
        self.symbols
            .get(name)
            .ok_or_else(|| SemanticError::UndeclaredVariable(name.to_owned()))
    }

    fn lookup_mut(&mut self, name: &str) -> Semantic<&mut SymbolInfo> {
        self.symbols
            .get_mut(name)
            .ok_or_else(|| SemanticError::UndeclaredVariable(name.to_owned()))
    }

    /// Tipo declarado de una variable, si existe.
    pub fn type_of(&self, name: &str) -> Option<VarType> {
        self.symbols.get(name).map(SymbolInfo::typ)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Verifica un comando y actualiza el estado de los símbolos que configura.
    pub fn check(&mut self, command: &Command) -> Semantic<()> {
        use Command::*;

        match command {
            Assign { target, value } => {
                let declared = self.lookup(target)?.typ;
                let inferred = infer::infer(value, self);

                match (declared, inferred) {
                    (VarType::Integer, VarType::Text) | (VarType::Text, VarType::Integer) => {
                        Err(SemanticError::TypeMismatch {
                            variable: target.clone(),
                            declared,
                            inferred,
                        })
                    }

                    // Booleano e indefinido no se verifican
                    _ => Ok(()),
                }
            }

            ConfigurePin { pin, direction } => {
                let info = self.lookup_mut(pin)?;
                info.roles.insert(Roles::PIN);
                info.mode = PinMode::from(*direction);
                Ok(())
            }

            ConfigurePwm { pin, .. } => {
                self.lookup_mut(pin)?.roles.insert(Roles::PWM);
                Ok(())
            }

            AdjustPwm { pin, .. } => {
                if self.lookup(pin)?.is_pwm() {
                    Ok(())
                } else {
                    Err(SemanticError::PwmNotConfigured(pin.clone()))
                }
            }

            TurnOn { pin } | TurnOff { pin } => {
                let info = self.lookup(pin)?;
                if !info.is_pin() {
                    Err(SemanticError::NotConfiguredAsPin(pin.clone()))
                } else if info.mode != PinMode::Output {
                    Err(SemanticError::WrongPinMode(
                        pin.clone(),
                        PinDirection::Output.keyword(),
                    ))
                } else {
                    Ok(())
                }
            }

            ReadDigital { target, pin } | ReadAnalog { target, pin } => {
                self.lookup(target)?;

                let info = self.lookup(pin)?;
                if info.is_pin() && info.mode == PinMode::Input {
                    Ok(())
                } else {
                    Err(SemanticError::WrongPinMode(
                        pin.clone(),
                        PinDirection::Input.keyword(),
                    ))
                }
            }

            ConnectWifi { .. }
            | Wait { .. }
            | SendHttp { .. }
            | ConfigureSerial { .. }
            | WriteSerial { .. }
            | ReadSerial
            | Conditional { .. }
            | WhileLoop { .. }
            | Undefined => Ok(()),
        }
    }
}

pub type Semantic<T> = Result<T, SemanticError>;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Variable `{0}` is declared more than once")]
    DuplicateDeclaration(String),

    #[error("Variable `{0}` is not declared")]
    UndeclaredVariable(String),

    #[error("Type mismatch in assignment to `{variable}`: declared `{declared}`, found `{inferred}`")]
    TypeMismatch {
        variable: String,
        declared: VarType,
        inferred: VarType,
    },

    #[error("`{0}` is not configured as a pin")]
    NotConfiguredAsPin(String),

    #[error("Pin `{0}` is not configured as `{1}`")]
    WrongPinMode(String, &'static str),

    #[error("Pin `{0}` must be configured with `configurarPWM` before `ajustarPWM`")]
    PwmNotConfigured(String),
}

impl Program {
    /// Valida el programa completo.
    ///
    /// En caso de éxito se retorna la tabla de símbolos final, la cual
    /// refleja los roles de hardware que cada variable adquirió.
    pub fn analyze(&self) -> Semantic<SymbolTable> {
        let mut symbols = SymbolTable::from_declarations(&self.declarations)?;
        for command in self.commands() {
            symbols.check(command)?;
        }

        Ok(symbols)
    }
}
