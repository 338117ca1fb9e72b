//! Inferencia de tipos de expresiones.
//!
//! Las expresiones se conservan como texto, por lo cual su tipo se infiere
//! a partir de reglas fijas sobre ese texto en vez de un recorrido de árbol.
//! Se aplica la primera regla que coincida:
//!
//! 1. Inicia con comillas: [`VarType::Text`].
//! 2. Es exactamente un identificador declarado: el tipo declarado.
//! 3. Es un literal entero, opcionalmente negativo: [`VarType::Integer`].
//! 4. Contiene alguno de `+ - * / ( )`: [`VarType::Integer`].
//! 5. En cualquier otro caso: [`VarType::Undefined`].
//!
//! Las subexpresiones nunca se examinan por separado.

use crate::{ast::VarType, semantic::SymbolTable};

const ARITHMETIC: &[char] = &['+', '-', '*', '/', '(', ')'];

pub fn infer(expr: &str, symbols: &SymbolTable) -> VarType {
    if expr.starts_with('"') {
        VarType::Text
    } else if let Some(typ) = symbols.type_of(expr) {
        typ
    } else if is_int_literal(expr) {
        VarType::Integer
    } else if expr.contains(ARITHMETIC) {
        VarType::Integer
    } else {
        VarType::Undefined
    }
}

fn is_int_literal(expr: &str) -> bool {
    let digits = expr.strip_prefix('-').unwrap_or(expr);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::VariableDeclaration;

    fn symbols() -> SymbolTable {
        SymbolTable::from_declarations(&[
            VariableDeclaration::new("brilho", VarType::Integer),
            VariableDeclaration::new("ssid", VarType::Text),
            VariableDeclaration::new("botao", VarType::Boolean),
            VariableDeclaration::new("misterio", VarType::Undefined),
        ])
        .unwrap()
    }

    #[test]
    fn quoted_text_is_text() {
        assert_eq!(infer("\"MinhaRedeWiFi\"", &symbols()), VarType::Text);
        assert_eq!(infer("\"1+2\"", &symbols()), VarType::Text);
    }

    #[test]
    fn identifiers_take_declared_type() {
        let symbols = symbols();
        assert_eq!(infer("brilho", &symbols), VarType::Integer);
        assert_eq!(infer("ssid", &symbols), VarType::Text);
        assert_eq!(infer("botao", &symbols), VarType::Boolean);
        assert_eq!(infer("misterio", &symbols), VarType::Undefined);
    }

    #[test]
    fn integer_literals() {
        let symbols = symbols();
        assert_eq!(infer("1000", &symbols), VarType::Integer);
        assert_eq!(infer("-42", &symbols), VarType::Integer);
    }

    #[test]
    fn operators_imply_integer() {
        let symbols = symbols();
        assert_eq!(infer("(brilho+1)", &symbols), VarType::Integer);
        assert_eq!(infer("(100+((20*2)))", &symbols), VarType::Integer);
        assert_eq!(infer("-", &symbols), VarType::Integer);
        assert_eq!(infer("(ssid==\"x\")", &symbols), VarType::Integer);
    }

    #[test]
    fn everything_else_is_undefined() {
        let symbols = symbols();
        assert_eq!(infer("", &symbols), VarType::Undefined);
        assert_eq!(infer("true", &symbols), VarType::Undefined);
        assert_eq!(infer("desconhecido", &symbols), VarType::Undefined);
        assert_eq!(infer("12abc", &symbols), VarType::Undefined);
    }

    #[test]
    fn quote_rule_wins_over_identifiers() {
        // Un identificador nunca inicia con comillas, pero el orden de
        // las reglas debe respetarse aun así.
        let symbols = SymbolTable::from_declarations(&[VariableDeclaration::new(
            "\"raro\"",
            VarType::Integer,
        )])
        .unwrap();

        assert_eq!(infer("\"raro\"", &symbols), VarType::Text);
    }
}
