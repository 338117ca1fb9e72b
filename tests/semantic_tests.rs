use pinc::{
    ast::{Command, PinDirection, Program, VarType, VariableDeclaration},
    semantic::{PinMode, Roles, SemanticError},
};

fn decl(name: &str, typ: VarType) -> VariableDeclaration {
    VariableDeclaration::new(name, typ)
}

fn program(declarations: Vec<VariableDeclaration>, setup: Vec<Command>) -> Program {
    Program {
        declarations,
        setup_commands: setup,
        loop_commands: Vec::new(),
    }
}

fn assign(target: &str, value: &str) -> Command {
    Command::Assign {
        target: target.into(),
        value: value.into(),
    }
}

fn configure(pin: &str, direction: PinDirection) -> Command {
    Command::ConfigurePin {
        pin: pin.into(),
        direction,
    }
}

fn configure_pwm(pin: &str) -> Command {
    Command::ConfigurePwm {
        pin: pin.into(),
        frequency: 5000,
        resolution: 8,
    }
}

fn adjust_pwm(pin: &str) -> Command {
    Command::AdjustPwm {
        pin: pin.into(),
        value: "128".into(),
    }
}

#[test]
fn duplicate_declaration_is_checked_before_commands() {
    let program = program(
        vec![decl("led", VarType::Integer), decl("led", VarType::Text)],
        // Este comando también es inválido, pero nunca se examina
        vec![Command::TurnOn {
            pin: "fantasma".into(),
        }],
    );

    assert_eq!(
        program.analyze().unwrap_err(),
        SemanticError::DuplicateDeclaration("led".into())
    );
}

#[test]
fn text_into_integer() {
    let program = program(
        vec![decl("brilho", VarType::Integer)],
        vec![assign("brilho", "\"alto\"")],
    );

    assert_eq!(
        program.analyze().unwrap_err(),
        SemanticError::TypeMismatch {
            variable: "brilho".into(),
            declared: VarType::Integer,
            inferred: VarType::Text,
        }
    );
}

#[test]
fn integer_into_text() {
    for value in &["42", "-1", "(a+1)", "contador"] {
        let program = program(
            vec![decl("ssid", VarType::Text), decl("contador", VarType::Integer)],
            vec![assign("ssid", value)],
        );

        assert!(
            matches!(
                program.analyze(),
                Err(SemanticError::TypeMismatch {
                    declared: VarType::Text,
                    inferred: VarType::Integer,
                    ..
                })
            ),
            "{}",
            value
        );
    }
}

#[test]
fn boolean_and_undefined_are_not_checked() {
    let program = program(
        vec![
            decl("botao", VarType::Boolean),
            decl("x", VarType::Undefined),
            decl("n", VarType::Integer),
            decl("s", VarType::Text),
        ],
        vec![
            assign("botao", "4"),
            assign("botao", "\"sim\""),
            assign("x", "\"qualquer\""),
            assign("n", "botao"),
            assign("s", "x"),
            assign("n", "true"),
            assign("s", "s"),
        ],
    );

    assert!(program.analyze().is_ok());
}

#[test]
fn assignment_to_undeclared_variable() {
    let program = program(vec![], vec![assign("nada", "1")]);
    assert_eq!(
        program.analyze().unwrap_err(),
        SemanticError::UndeclaredVariable("nada".into())
    );
}

#[test]
fn configure_undeclared_pin() {
    let program = program(
        vec![decl("ledPin", VarType::Integer)],
        vec![configure("botao", PinDirection::Input)],
    );

    let error = program.analyze().unwrap_err();
    assert_eq!(error, SemanticError::UndeclaredVariable("botao".into()));
    assert!(error.to_string().contains("botao"));
}

#[test]
fn pwm_must_be_configured_before_adjusting() {
    let declarations = vec![decl("led", VarType::Integer)];

    let unconfigured = program(declarations.clone(), vec![adjust_pwm("led")]);
    assert_eq!(
        unconfigured.analyze().unwrap_err(),
        SemanticError::PwmNotConfigured("led".into())
    );

    let configured = program(declarations, vec![configure_pwm("led"), adjust_pwm("led")]);
    assert!(configured.analyze().is_ok());
}

#[test]
fn pwm_configured_in_setup_is_valid_in_loop() {
    let program = Program {
        declarations: vec![decl("led", VarType::Integer)],
        setup_commands: vec![configure_pwm("led")],
        loop_commands: vec![adjust_pwm("led")],
    };

    assert!(program.analyze().is_ok());
}

#[test]
fn setup_is_checked_before_loop() {
    let program = Program {
        declarations: vec![decl("led", VarType::Integer)],
        setup_commands: vec![adjust_pwm("led")],
        loop_commands: vec![configure_pwm("led")],
    };

    assert_eq!(
        program.analyze().unwrap_err(),
        SemanticError::PwmNotConfigured("led".into())
    );
}

#[test]
fn digital_writes_require_output() {
    for command in [
        Command::TurnOn { pin: "led".into() },
        Command::TurnOff { pin: "led".into() },
    ] {
        let declarations = vec![decl("led", VarType::Integer)];

        let input = program(
            declarations.clone(),
            vec![configure("led", PinDirection::Input), command.clone()],
        );
        assert_eq!(
            input.analyze().unwrap_err(),
            SemanticError::WrongPinMode("led".into(), "saida")
        );

        let output = program(
            declarations.clone(),
            vec![configure("led", PinDirection::Output), command.clone()],
        );
        assert!(output.analyze().is_ok());

        let unconfigured = program(declarations, vec![command]);
        assert_eq!(
            unconfigured.analyze().unwrap_err(),
            SemanticError::NotConfiguredAsPin("led".into())
        );
    }
}

#[test]
fn pwm_does_not_make_a_digital_pin() {
    let program = program(
        vec![decl("led", VarType::Integer)],
        vec![configure_pwm("led"), Command::TurnOn { pin: "led".into() }],
    );

    assert_eq!(
        program.analyze().unwrap_err(),
        SemanticError::NotConfiguredAsPin("led".into())
    );
}

#[test]
fn reconfiguration_overwrites_direction() {
    let program = program(
        vec![decl("led", VarType::Integer)],
        vec![
            configure("led", PinDirection::Input),
            configure("led", PinDirection::Output),
            Command::TurnOn { pin: "led".into() },
        ],
    );

    let symbols = program.analyze().unwrap();
    let led = symbols.lookup("led").unwrap();
    assert_eq!(led.pin_mode(), PinMode::Output);
    assert_eq!(led.roles(), Roles::PIN);
}

#[test]
fn reads_require_input_pin() {
    let declarations = vec![decl("estado", VarType::Boolean), decl("botao", VarType::Integer)];
    let read_digital = Command::ReadDigital {
        target: "estado".into(),
        pin: "botao".into(),
    };
    let read_analog = Command::ReadAnalog {
        target: "estado".into(),
        pin: "botao".into(),
    };

    for read in [read_digital, read_analog] {
        let valid = program(
            declarations.clone(),
            vec![configure("botao", PinDirection::Input), read.clone()],
        );
        assert!(valid.analyze().is_ok());

        let output = program(
            declarations.clone(),
            vec![configure("botao", PinDirection::Output), read.clone()],
        );
        assert_eq!(
            output.analyze().unwrap_err(),
            SemanticError::WrongPinMode("botao".into(), "entrada")
        );

        let unconfigured = program(declarations.clone(), vec![read.clone()]);
        assert_eq!(
            unconfigured.analyze().unwrap_err(),
            SemanticError::WrongPinMode("botao".into(), "entrada")
        );
    }
}

#[test]
fn reads_check_destination_first() {
    let program = program(
        vec![decl("botao", VarType::Integer)],
        vec![Command::ReadDigital {
            target: "estado".into(),
            pin: "fantasma".into(),
        }],
    );

    assert_eq!(
        program.analyze().unwrap_err(),
        SemanticError::UndeclaredVariable("estado".into())
    );
}

#[test]
fn other_commands_pass_through() {
    let program = program(
        vec![],
        vec![
            Command::ConnectWifi {
                ssid: "ssid".into(),
                password: "senha".into(),
            },
            Command::Wait {
                time: "tempo".into(),
            },
            Command::SendHttp {
                url: "url".into(),
                data: "dados".into(),
            },
            Command::ConfigureSerial { baud: 9600 },
            Command::WriteSerial {
                message: "msg".into(),
            },
            Command::ReadSerial,
            Command::Conditional {
                condition: "x".into(),
            },
            Command::WhileLoop {
                condition: "y".into(),
            },
            Command::Undefined,
        ],
    );

    assert!(program.analyze().unwrap().is_empty());
}

#[test]
fn first_error_stops_analysis() {
    let program = program(
        vec![decl("led", VarType::Integer)],
        vec![
            Command::TurnOn { pin: "led".into() },
            Command::TurnOn {
                pin: "fantasma".into(),
            },
        ],
    );

    assert_eq!(
        program.analyze().unwrap_err(),
        SemanticError::NotConfiguredAsPin("led".into())
    );
}

#[test]
fn every_analysis_starts_fresh() {
    let program = program(
        vec![decl("led", VarType::Integer)],
        vec![configure_pwm("led")],
    );

    let first = program.analyze().unwrap();
    let second = program.analyze().unwrap();

    assert!(first.lookup("led").unwrap().is_pwm());
    assert_eq!(first.lookup("led").unwrap(), second.lookup("led").unwrap());
    assert_eq!(second.len(), 1);
}
