use std::fmt;
use std::str::FromStr;

/// One on/off slot per step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    steps: Vec<bool>,
}

impl Pattern {
    pub fn new(steps: Vec<bool>) -> Self {
        Self { steps }
    }

    pub fn from_bits(bits: &[u8]) -> Self {
        Self::new(bits.iter().map(|b| *b != 0).collect())
    }

    pub fn empty(len: usize) -> Self {
        Self::new(vec![false; len])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Out-of-range steps read as rests
    pub fn is_active(&self, step: usize) -> bool {
        self.steps.get(step).copied().unwrap_or(false)
    }

    /// Flips one step; returns false when `step` is out of range
    pub fn toggle(&mut self, step: usize) -> bool {
        match self.steps.get_mut(step) {
            Some(slot) => {
                *slot = !*slot;
                true
            }
            None => false,
        }
    }

    pub fn steps(&self) -> &[bool] {
        &self.steps
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePatternError(char);

impl fmt::Display for ParsePatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected '{}' in pattern (use x/1 for hits, ./-/0 for rests)", self.0)
    }
}

impl std::error::Error for ParsePatternError {}

/// Parses grid notation such as `"x...x...x...x..."`; spaces and bar lines are
/// ignored.
impl FromStr for Pattern {
    type Err = ParsePatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .filter(|c| !c.is_whitespace() && *c != '|')
            .map(|c| match c {
                'x' | 'X' | '1' => Ok(true),
                '.' | '-' | '0' => Ok(false),
                other => Err(ParsePatternError(other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Pattern::new)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for on in &self.steps {
            f.write_str(if *on { "x" } else { "." })?;
        }
        Ok(())
    }
}
