/// How much an applied vote adds to its choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Weighting {
    /// Every vote counts once, regardless of the voter's weight.
    #[default]
    Unit,

    /// Every vote counts as the voter's weight in the registry.
    Weighted,
}

impl Weighting {
    /// Return the contribution of a vote by a voter with `weight`.
    pub fn contribution(&self, weight: u64) -> u64 {
        match self {
            Weighting::Unit => 1,
            Weighting::Weighted => weight,
        }
    }
}

/// Configuration for a [crate::Session].
#[derive(Clone, Debug)]
pub struct Config {
    /// The application namespace votes are signed under.
    /// Used to prevent replay attacks on other applications.
    pub namespace: Vec<u8>,

    /// How applied votes are counted.
    pub weighting: Weighting,
}
