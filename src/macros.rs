/// Escribe una línea de C++ con la sangría actual del emisor.
macro_rules! emit {
    ($cx:expr, $($format:tt)*) => {{
        write!($cx.output, "{:indent$}", "", indent = $cx.indent)?;
        writeln!($cx.output, $($format)*)
    }};
}
