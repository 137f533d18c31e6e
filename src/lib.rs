pub mod config;
pub mod diagnostic;
pub mod eval;
pub mod fragment;
pub mod intrinsic;
pub mod op;
pub mod optimize;
pub mod span;
pub mod symbol;
pub mod synth;
pub mod types;

pub use config::SynthConfig;
pub use diagnostic::{Violation, ViolationKind};
pub use eval::{Evaluator, Interpreter, Value};
pub use fragment::{Fragment, Lineage, RenderMode};
pub use symbol::{SymbolKey, SymbolTable};
pub use synth::Synthesizer;
pub use types::{FragType, Kind, Taint};

/// Synthesize `value` with an empty cache and the discovered configuration,
/// returning the compile-mode text.
///
/// Failures are rendered to stderr before being returned.
pub fn synthesize(value: &Value, filename: &str) -> Result<String, Violation> {
    let result = SynthConfig::discover()
        .and_then(|config| Synthesizer::with_config(config).synthesize(value));
    match result {
        Ok(fragment) => Ok(fragment.compile()),
        Err(violation) => {
            violation.render(filename);
            Err(violation)
        }
    }
}

/// Evaluate fragment text with the built-in interpreter.
pub fn evaluate(source: &str) -> Result<Value, Violation> {
    Interpreter::new().evaluate(source)
}
