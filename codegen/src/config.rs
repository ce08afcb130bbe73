/// Where the generated declarations are placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleName {
    Named(String),
    /// Derived from the binding name: lower-cased with dots removed.
    FromBinding,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Wraps the output in `pub mod <name> { .. }` when set.
    pub module: Option<ModuleName>,
}

const FALLBACK_MODULE: &str = "internal";

pub(crate) fn binding_module_name(binding: &str) -> String {
    let name = binding.to_lowercase().replace('.', "");
    let name = crate::sanitize::field_name(&name);

    if binding.trim().is_empty() {
        FALLBACK_MODULE.to_owned()
    } else {
        name
    }
}

impl GeneratorConfig {
    pub fn module_name(&self, binding: &str) -> Option<String> {
        match &self.module {
            Some(ModuleName::Named(name)) => Some(crate::sanitize::field_name(name)),
            Some(ModuleName::FromBinding) => Some(binding_module_name(binding)),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_names() {
        assert_eq!(binding_module_name("Ping.Binding"), "pingbinding");
        assert_eq!(binding_module_name(""), "internal");

        let config = GeneratorConfig {
            module: Some(ModuleName::Named("Weather Service".into())),
        };
        assert_eq!(config.module_name("ignored").as_deref(), Some("weather_service"));
        assert_eq!(GeneratorConfig::default().module_name("Binding"), None);
    }
}
