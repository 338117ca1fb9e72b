//! Asignación de canales PWM.
//!
//! El lenguaje no expone canales: `configurarPWM` solo nombra un pino.
//! Cada pino distinto recibe el siguiente canal libre en orden de aparición
//! dentro del bloque `config`, empezando en 0. Configuraciones repetidas de
//! un mismo pino conservan el canal, frecuencia y resolución de la primera.

use crate::ast::Command;

/// Canal asignado a un pino junto con su configuración.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelBinding {
    pub channel: u32,
    pub frequency: i32,
    pub resolution: i32,
}

/// Asignaciones de una sola generación de código, en orden de canal.
#[derive(Clone, Debug, Default)]
pub struct PwmChannels {
    bindings: Vec<(String, ChannelBinding)>,
}

impl PwmChannels {
    pub fn allocate(commands: &[Command]) -> Self {
        let mut channels = PwmChannels::default();

        for command in commands {
            if let Command::ConfigurePwm {
                pin,
                frequency,
                resolution,
            } = command
            {
                if channels.get(pin).is_some() {
                    continue;
                }

                let binding = ChannelBinding {
                    channel: channels.bindings.len() as u32,
                    frequency: *frequency,
                    resolution: *resolution,
                };

                channels.bindings.push((pin.clone(), binding));
            }
        }

        channels
    }

    pub fn get(&self, pin: &str) -> Option<&ChannelBinding> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == pin)
            .map(|(_, binding)| binding)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChannelBinding)> {
        self.bindings
            .iter()
            .map(|(pin, binding)| (pin.as_str(), binding))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
