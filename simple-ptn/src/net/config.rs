use derive_builder::Builder;

/// Configuration of a [`PetriNet`](super::PetriNet).
///
/// ```
/// use simple_ptn::net::{PetriNet, PetriNetConfigBuilder};
///
/// let config = PetriNetConfigBuilder::default().name("harbor").build()?;
/// let net: PetriNet = PetriNet::with_config(config);
/// assert_eq!(net.name(), "harbor");
/// # Ok::<(), simple_ptn::PetriError>(())
/// ```
#[derive(Builder, Clone, Debug)]
pub struct PetriNetConfig {
    /// Label attached to all log output of the net.
    #[builder(setter(into), default = "\"net\".to_string()")]
    pub name: String,
}

impl Default for PetriNetConfig {
    fn default() -> Self {
        PetriNetConfig { name: "net".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        let built = PetriNetConfigBuilder::default().build().unwrap();
        assert_eq!(built.name, PetriNetConfig::default().name);
    }

    #[test]
    fn builder_sets_name() {
        let built = PetriNetConfigBuilder::default().name("terminal").build().unwrap();
        assert_eq!(built.name, "terminal");
    }
}
