//! Link-time registry of every `#[gpt]` function in the program.

use crate::error::ConfigurationError;
use crate::function::GptFunction;

/// Link-time record of a `#[gpt]` function, submitted by the macro.
pub struct FunctionRegistration {
    /// Function name as declared in source
    pub name: &'static str,
    /// Doc comment as written
    pub doc: &'static str,
    /// Accessor for the lazily built function
    pub function: fn() -> Result<&'static GptFunction, ConfigurationError>,
}

impl FunctionRegistration {
    pub const fn new(
        name: &'static str,
        doc: &'static str,
        function: fn() -> Result<&'static GptFunction, ConfigurationError>,
    ) -> Self {
        Self {
            name,
            doc,
            function,
        }
    }

    pub fn function(&self) -> Result<&'static GptFunction, ConfigurationError> {
        (self.function)()
    }
}

inventory::collect!(FunctionRegistration);

/// Every `#[gpt]` function linked into the program, in no particular order.
pub fn registered_functions() -> impl Iterator<Item = &'static FunctionRegistration> {
    inventory::iter::<FunctionRegistration>.into_iter()
}

/// Look a registered function up by name.
pub fn find_function(name: &str) -> Option<&'static FunctionRegistration> {
    registered_functions().find(|reg| reg.name == name)
}
