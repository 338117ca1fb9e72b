//! Generación de código C++ para Arduino/ESP32.
//!
//! El programa se traduce a un único archivo con la siguiente estructura:
//! includes, variables globales, constantes de canales PWM, `setup()` con
//! el bloque `config` y `loop()` con el bloque `repita`. Cada comando se
//! traduce con una plantilla fija; no se reordena ni se optimiza nada.
//!
//! Este módulo no valida. Se asume que [`Program::analyze()`] ya aceptó el
//! programa; en caso contrario la salida puede no compilar, pero su
//! emisión nunca falla por razones distintas a E/S.

use std::io::{self, Write};

use crate::{
    ast::{Command, PinDirection, Program, VarType},
    pwm::PwmChannels,
};

/// Dependencias del runtime de Arduino que usan las plantillas.
const PREAMBLE: &[&str] = &["Arduino.h", "WiFi.h", "HTTPClient.h"];

/// Sangría por nivel de bloque.
const INDENT: usize = 2;

/// Periodo de sondeo mientras se espera a que WiFi conecte, en ms.
const WIFI_POLL_MS: u32 = 500;

/// Emite el programa completo.
pub fn emit<W: Write>(program: &Program, output: &mut W) -> io::Result<()> {
    let channels = PwmChannels::allocate(&program.setup_commands);
    let mut cx = Context {
        output,
        indent: 0,
    };

    for header in PREAMBLE {
        emit!(cx, "#include <{}>", header)?;
    }

    writeln!(cx.output)?;
    emit!(cx, "// ========== Variáveis Globais ==========")?;
    for declaration in &program.declarations {
        emit!(cx, "{} {};", cpp_type(declaration.typ), declaration.name)?;
    }

    if !channels.is_empty() {
        writeln!(cx.output)?;
        emit!(cx, "// ========== Canais PWM ==========")?;
    }

    for (pin, binding) in channels.iter() {
        emit!(cx, "const int canal_{} = {};", pin, binding.channel)?;
        emit!(cx, "const int freq_{} = {};", pin, binding.frequency)?;
        emit!(cx, "const int resol_{} = {};", pin, binding.resolution)?;
    }

    cx.function("setup", &program.setup_commands)?;
    cx.function("loop", &program.loop_commands)
}

/// Conveniencia para emitir a memoria.
pub fn generate(program: &Program) -> String {
    let mut output = Vec::new();
    // Escribir a un `Vec<u8>` no falla
    emit(program, &mut output).expect("writing to a Vec<u8> cannot fail");

    String::from_utf8_lossy(&output).into_owned()
}

fn cpp_type(typ: VarType) -> &'static str {
    match typ {
        VarType::Integer => "int",
        VarType::Text => "String",
        VarType::Boolean => "bool",
        VarType::Undefined => "int",
    }
}

struct Context<'a, W> {
    output: &'a mut W,
    indent: usize,
}

impl<W: Write> Context<'_, W> {
    fn function(&mut self, name: &str, commands: &[Command]) -> io::Result<()> {
        writeln!(self.output)?;
        emit!(self, "void {}() {{", name)?;

        self.block(|cx| {
            for command in commands {
                cx.command(command)?;
            }

            Ok(())
        })?;

        emit!(self, "}}")
    }

    fn block<F>(&mut self, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        self.indent += INDENT;
        let result = body(self);
        self.indent -= INDENT;

        result
    }

    fn command(&mut self, command: &Command) -> io::Result<()> {
        use Command::*;

        match command {
            Assign { target, value } => emit!(self, "{} = {};", target, value),

            ConfigurePin { pin, direction } => {
                let mode = match direction {
                    PinDirection::Input => "INPUT",
                    PinDirection::Output => "OUTPUT",
                };

                emit!(self, "pinMode({}, {});", pin, mode)
            }

            ConfigurePwm { pin, .. } => {
                emit!(self, "ledcSetup(canal_{0}, freq_{0}, resol_{0});", pin)?;
                emit!(self, "ledcAttachPin({0}, canal_{0});", pin)
            }

            AdjustPwm { pin, value } => emit!(self, "ledcWrite(canal_{}, {});", pin, value),

            ConnectWifi { ssid, password } => {
                emit!(self, "WiFi.begin({}.c_str(), {}.c_str());", ssid, password)?;
                emit!(self, "while (WiFi.status() != WL_CONNECTED) {{")?;
                self.block(|cx| emit!(cx, "delay({});", WIFI_POLL_MS))?;
                emit!(self, "}}")
            }

            Wait { time } => emit!(self, "delay({});", time),
            TurnOn { pin } => emit!(self, "digitalWrite({}, HIGH);", pin),
            TurnOff { pin } => emit!(self, "digitalWrite({}, LOW);", pin),

            SendHttp { url, data } => {
                emit!(self, "{{")?;
                self.block(|cx| {
                    emit!(cx, "HTTPClient http;")?;
                    emit!(cx, "http.begin({});", url)?;
                    emit!(
                        cx,
                        "http.addHeader(\"Content-Type\", \"application/x-www-form-urlencoded\");"
                    )?;
                    emit!(cx, "http.POST({});", data)?;
                    emit!(cx, "http.end();")
                })?;
                emit!(self, "}}")
            }

            ConfigureSerial { baud } => emit!(self, "Serial.begin({});", baud),
            WriteSerial { message } => emit!(self, "Serial.println({});", message),

            ReadSerial => {
                emit!(self, "{{")?;
                self.block(|cx| emit!(cx, "String valor = Serial.readStringUntil('\\n');"))?;
                emit!(self, "}}")
            }

            ReadDigital { target, pin } => emit!(self, "{} = digitalRead({});", target, pin),
            ReadAnalog { target, pin } => emit!(self, "{} = analogRead({});", target, pin),

            // No hay cuerpos que expandir
            Conditional { condition } => {
                emit!(self, "// se {}: comandos aninhados não expandidos", condition)
            }

            WhileLoop { condition } => {
                emit!(self, "// enquanto {}: comandos aninhados não expandidos", condition)
            }

            Undefined => Ok(()),
        }
    }
}
