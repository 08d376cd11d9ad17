/// Blueprint of a transition, referring to places by id.
///
/// Weights are subtracted from the input places and added to the output places when the
/// transition fires. A place may appear several times on the same side, its weights add up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionSketch<I, T> {
    pub id: I,
    pub inputs: Vec<(I, T)>,
    pub outputs: Vec<(I, T)>,
}

impl<I, T> TransitionSketch<I, T> {
    /// Sketch without any arcs.
    pub fn new(id: impl Into<I>) -> Self {
        TransitionSketch { id: id.into(), inputs: Vec::new(), outputs: Vec::new() }
    }

    /// Add an input arc taking `weight` tokens from `place`.
    pub fn input(mut self, place: impl Into<I>, weight: T) -> Self {
        self.inputs.push((place.into(), weight));
        self
    }

    /// Add an output arc putting `weight` tokens onto `place`.
    pub fn output(mut self, place: impl Into<I>, weight: T) -> Self {
        self.outputs.push((place.into(), weight));
        self
    }

    /// All place ids referenced by this sketch, inputs first.
    pub fn places(&self) -> impl Iterator<Item = &I> {
        self.inputs.iter().chain(&self.outputs).map(|(place, _)| place)
    }
}

impl<I, T> From<(I, Vec<(I, T)>, Vec<(I, T)>)> for TransitionSketch<I, T> {
    fn from((id, inputs, outputs): (I, Vec<(I, T)>, Vec<(I, T)>)) -> Self {
        TransitionSketch { id, inputs, outputs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluent_and_tuple_forms_agree() {
        let fluent: TransitionSketch<String, u32> =
            TransitionSketch::new("t").input("a", 2).input("b", 1).output("c", 3);
        let tuple = TransitionSketch::from((
            "t".to_string(),
            vec![("a".to_string(), 2), ("b".to_string(), 1)],
            vec![("c".to_string(), 3)],
        ));
        assert_eq!(fluent, tuple);
    }

    #[test]
    fn places_lists_inputs_then_outputs() {
        let sketch: TransitionSketch<&str, u32> =
            TransitionSketch::new("t").output("c", 1).input("a", 1).input("a", 2);
        assert_eq!(sketch.places().copied().collect::<Vec<_>>(), vec!["a", "a", "c"]);
    }
}
