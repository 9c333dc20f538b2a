//! Viterbi decoding over a hidden Markov model.
//!
//! Probabilities are multiplied in the linear domain. Long inputs would
//! underflow, so after every step the column maximum is checked against an
//! [`UnderflowPolicy`]: very small columns are rescaled, and in bigram mode a
//! column that has collapsed entirely restarts the chain.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Markov order of the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Condition on the previous tag
    #[default]
    Bigram,
    /// Condition on the two previous tags
    Trigram,
}

/// A model the decoder can run against.
///
/// States are dense indices `0..num_states()`. Ties between equally likely
/// states resolve to the higher index.
pub trait HiddenMarkovModel {
    /// Number of hidden states
    fn num_states(&self) -> usize;

    /// Probability of starting in `state`
    fn initial(&self, state: usize) -> f64;

    /// P(`state` | `prev`)
    fn bigram_transition(&self, prev: usize, state: usize) -> f64;

    /// P(`state` | `prev2`, `prev1`)
    fn trigram_transition(&self, prev2: usize, prev1: usize, state: usize) -> f64;

    /// Emission probabilities of `observation` for every state, or `None` if
    /// the observation was never seen.
    fn emission_row(&self, observation: &str) -> Option<&[f64]>;
}

/// Thresholds that keep long decodes away from floating point underflow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderflowPolicy {
    /// Bigram only: below this column maximum the chain restarts
    pub reset_below: f64,
    /// Below this column maximum the column is multiplied by `rescale_factor`
    pub rescale_below: f64,
    /// Multiplier applied to a rescaled column
    pub rescale_factor: f64,
}

impl Default for UnderflowPolicy {
    fn default() -> Self {
        UnderflowPolicy {
            reset_below: 1e-40,
            rescale_below: 1e-15,
            rescale_factor: 1e10,
        }
    }
}

impl UnderflowPolicy {
    /// Never reset or rescale
    pub fn disabled() -> Self {
        UnderflowPolicy {
            reset_below: 0.0,
            rescale_below: 0.0,
            rescale_factor: 1.0,
        }
    }
}

/// Most likely state sequence plus how often underflow handling kicked in
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViterbiPath {
    /// One state per observation
    pub states: Vec<usize>,
    /// Bigram chain restarts
    pub resets: usize,
    /// Column rescales
    pub rescales: usize,
}

/// Viterbi decoder with a fixed underflow policy
#[derive(Debug, Clone, Copy, Default)]
pub struct ViterbiDecoder {
    policy: UnderflowPolicy,
}

impl ViterbiDecoder {
    /// Decoder using `policy` for every call
    pub fn new(policy: UnderflowPolicy) -> Self {
        ViterbiDecoder { policy }
    }

    /// The underflow thresholds in use
    pub fn policy(&self) -> UnderflowPolicy {
        self.policy
    }

    /// Decode `observations` with the given order
    pub fn decode<M, S>(&self, model: &M, observations: &[S], order: Order) -> Result<ViterbiPath>
    where
        M: HiddenMarkovModel + ?Sized,
        S: AsRef<str>,
    {
        match order {
            Order::Bigram => self.bigram(model, observations),
            Order::Trigram => self.trigram(model, observations),
        }
    }

    /// First-order decode
    pub fn bigram<M, S>(&self, model: &M, observations: &[S]) -> Result<ViterbiPath>
    where
        M: HiddenMarkovModel + ?Sized,
        S: AsRef<str>,
    {
        let n = model.num_states();
        if n == 0 {
            return Err(Error::EmptyTagSet);
        }
        if observations.is_empty() {
            return Ok(ViterbiPath::default());
        }

        let rows = emission_rows(model, observations);
        let emit = |t: usize, s: usize| rows[t].map_or(0.0, |row| row[s]);
        let mut path = ViterbiPath::default();

        let mut scores: Vec<f64> = (0..n).map(|s| model.initial(s) * emit(0, s)).collect();
        let mut back: Vec<Vec<usize>> = Vec::with_capacity(observations.len());
        back.push(vec![0; n]);

        for t in 1..observations.len() {
            let mut next = vec![0.0; n];
            let mut pointers = vec![0; n];
            for s in 0..n {
                let e = emit(t, s);
                let (best, prev) =
                    argmax((0..n).map(|p| scores[p] * model.bigram_transition(p, s) * e));
                next[s] = best;
                pointers[s] = prev;
            }

            let (max, _) = argmax(next.iter().copied());
            if max < self.policy.reset_below {
                // the chain is gone: start over from the best fresh state,
                // linked to the best state of the previous column
                let (fresh, state) = argmax((0..n).map(|s| model.initial(s) * emit(t, s)));
                let (_, prev) = argmax(scores.iter().copied());
                next[state] = fresh;
                pointers[state] = prev;
                path.resets += 1;
            } else if max < self.policy.rescale_below {
                rescale(&mut next, self.policy.rescale_factor);
                path.rescales += 1;
            }

            scores = next;
            back.push(pointers);
        }

        let (_, mut state) = argmax(scores.iter().copied());
        let mut states = vec![0; observations.len()];
        states[observations.len() - 1] = state;
        for t in (1..observations.len()).rev() {
            state = back[t][state];
            states[t - 1] = state;
        }

        path.states = states;
        Ok(path)
    }

    /// Second-order decode. Only rescaling applies here.
    pub fn trigram<M, S>(&self, model: &M, observations: &[S]) -> Result<ViterbiPath>
    where
        M: HiddenMarkovModel + ?Sized,
        S: AsRef<str>,
    {
        let n = model.num_states();
        if n == 0 {
            return Err(Error::EmptyTagSet);
        }
        if observations.is_empty() {
            return Ok(ViterbiPath::default());
        }

        let rows = emission_rows(model, observations);
        let emit = |t: usize, s: usize| rows[t].map_or(0.0, |row| row[s]);
        let mut path = ViterbiPath::default();

        // scores[p1 * n + s]: best chain ending in (p1, s)
        let mut scores = vec![0.0; n * n];
        for p1 in 0..n {
            for s in 0..n {
                scores[p1 * n + s] = model.initial(s) * emit(0, s);
            }
        }
        // back[t][p1 * n + s]: the state before p1
        let mut back: Vec<Vec<usize>> = Vec::with_capacity(observations.len());
        back.push(vec![0; n * n]);

        for t in 1..observations.len() {
            let mut next = vec![0.0; n * n];
            let mut pointers = vec![0; n * n];
            for s in 0..n {
                let e = emit(t, s);
                for p1 in 0..n {
                    let (best, p2) = argmax((0..n).map(|p2| {
                        scores[p2 * n + p1] * model.trigram_transition(p2, p1, s) * e
                    }));
                    next[p1 * n + s] = best;
                    pointers[p1 * n + s] = p2;
                }
            }

            let (max, _) = argmax(next.iter().copied());
            if max < self.policy.rescale_below {
                rescale(&mut next, self.policy.rescale_factor);
                path.rescales += 1;
            }

            scores = next;
            back.push(pointers);
        }

        let (_, best) = argmax(scores.iter().copied());
        let (mut p1, mut state) = (best / n, best % n);
        let mut states = vec![0; observations.len()];
        states[observations.len() - 1] = state;
        for t in (1..observations.len()).rev() {
            let p2 = back[t][p1 * n + state];
            states[t - 1] = p1;
            state = p1;
            p1 = p2;
        }

        path.states = states;
        Ok(path)
    }
}

fn emission_rows<'m, M, S>(model: &'m M, observations: &[S]) -> Vec<Option<&'m [f64]>>
where
    M: HiddenMarkovModel + ?Sized,
    S: AsRef<str>,
{
    observations
        .iter()
        .map(|o| model.emission_row(o.as_ref()))
        .collect()
}

/// Largest value and its index; ties go to the later index.
fn argmax(values: impl IntoIterator<Item = f64>) -> (f64, usize) {
    let mut best = (f64::NEG_INFINITY, 0);
    for (i, v) in values.into_iter().enumerate() {
        if v >= best.0 {
            best = (v, i);
        }
    }
    best
}

fn rescale(column: &mut [f64], factor: f64) {
    for p in column.iter_mut() {
        *p *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Dense tables indexed the same way as the decoder
    #[derive(Debug)]
    struct TableModel {
        n: usize,
        initial: Vec<f64>,
        bigram: Vec<f64>,
        trigram: Vec<f64>,
        emission: HashMap<String, Vec<f64>>,
    }

    impl HiddenMarkovModel for TableModel {
        fn num_states(&self) -> usize {
            self.n
        }
        fn initial(&self, state: usize) -> f64 {
            self.initial[state]
        }
        fn bigram_transition(&self, prev: usize, state: usize) -> f64 {
            self.bigram[prev * self.n + state]
        }
        fn trigram_transition(&self, prev2: usize, prev1: usize, state: usize) -> f64 {
            self.trigram[(prev2 * self.n + prev1) * self.n + state]
        }
        fn emission_row(&self, observation: &str) -> Option<&[f64]> {
            self.emission.get(observation).map(Vec::as_slice)
        }
    }

    /// Noun (0) / verb (1) toy model
    fn toy() -> TableModel {
        let mut emission = HashMap::new();
        emission.insert("dog".to_string(), vec![0.9, 0.1]);
        emission.insert("runs".to_string(), vec![0.1, 0.9]);
        TableModel {
            n: 2,
            initial: vec![0.6, 0.4],
            bigram: vec![0.3, 0.7, 0.8, 0.2],
            trigram: vec![0.5; 8],
            emission,
        }
    }

    #[test]
    fn test_bigram_known_answer() {
        let path = ViterbiDecoder::default()
            .bigram(&toy(), &["dog", "runs", "dog"])
            .unwrap();
        assert_eq!(path.states, vec![0, 1, 0]);
        assert_eq!(path.resets, 0);
        assert_eq!(path.rescales, 0);
    }

    #[test]
    fn test_trigram_follows_emissions() {
        let path = ViterbiDecoder::default()
            .trigram(&toy(), &["dog", "runs", "dog", "runs"])
            .unwrap();
        assert_eq!(path.states, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_length_preserved() {
        let decoder = ViterbiDecoder::default();
        let obs = ["dog", "dog", "runs", "zzz", "dog"];
        for order in [Order::Bigram, Order::Trigram] {
            let path = decoder.decode(&toy(), &obs, order).unwrap();
            assert_eq!(path.states.len(), obs.len());
            assert!(path.states.iter().all(|&s| s < 2));
        }
    }

    #[test]
    fn test_empty_inputs() {
        let decoder = ViterbiDecoder::default();
        let none: [&str; 0] = [];
        assert!(decoder.bigram(&toy(), &none).unwrap().states.is_empty());

        let empty = TableModel {
            n: 0,
            initial: vec![],
            bigram: vec![],
            trigram: vec![],
            emission: HashMap::new(),
        };
        assert!(matches!(
            decoder.decode(&empty, &["dog"], Order::Bigram),
            Err(Error::EmptyTagSet)
        ));
        assert!(matches!(
            decoder.decode(&empty, &["dog"], Order::Trigram),
            Err(Error::EmptyTagSet)
        ));
    }

    #[test]
    fn test_unknown_observation_resets_chain() {
        let path = ViterbiDecoder::default()
            .bigram(&toy(), &["dog", "zzz", "dog"])
            .unwrap();
        assert_eq!(path.resets, 2);
        assert_eq!(path.states, vec![0, 1, 0]);
    }

    #[test]
    fn test_ties_prefer_later_state() {
        let mut emission = HashMap::new();
        emission.insert("x".to_string(), vec![0.5, 0.5, 0.5]);
        let model = TableModel {
            n: 3,
            initial: vec![1.0 / 3.0; 3],
            bigram: vec![1.0 / 3.0; 9],
            trigram: vec![1.0 / 3.0; 27],
            emission,
        };
        let decoder = ViterbiDecoder::default();
        let path = decoder.bigram(&model, &["x", "x"]).unwrap();
        assert_eq!(path.states, vec![2, 2]);
        let path = decoder.trigram(&model, &["x", "x"]).unwrap();
        assert_eq!(path.states, vec![2, 2]);
    }

    #[test]
    fn test_rescale_kicks_in() {
        let mut model = toy();
        model
            .emission
            .insert("faint".to_string(), vec![1e-4, 2e-4]);
        let obs = vec!["faint"; 8];
        let scaled = ViterbiDecoder::default().bigram(&model, &obs).unwrap();
        let plain = ViterbiDecoder::new(UnderflowPolicy::disabled())
            .bigram(&model, &obs)
            .unwrap();
        assert!(scaled.rescales > 0);
        assert_eq!(scaled.resets, 0);
        assert_eq!(scaled.states, plain.states);
    }

    mod properties {
        use super::*;
        use proptest::collection::vec;
        use proptest::prelude::*;

        const WORDS: [&str; 3] = ["a", "b", "c"];

        fn model_and_input() -> impl Strategy<Value = (TableModel, Vec<&'static str>)> {
            (2usize..4)
                .prop_flat_map(|n| {
                    (
                        Just(n),
                        vec(1e-4f64..1.0, n),
                        vec(1e-4f64..1.0, n * n),
                        vec(1e-4f64..1.0, n * n * n),
                        vec(1e-4f64..1.0, WORDS.len() * n),
                        vec(0usize..WORDS.len(), 1..7),
                    )
                })
                .prop_map(|(n, initial, bigram, trigram, emit, obs)| {
                    let emission = WORDS
                        .iter()
                        .enumerate()
                        .map(|(w, word)| (word.to_string(), emit[w * n..(w + 1) * n].to_vec()))
                        .collect();
                    let model = TableModel {
                        n,
                        initial,
                        bigram,
                        trigram,
                        emission,
                    };
                    (model, obs.into_iter().map(|i| WORDS[i]).collect())
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prop_rescaling_keeps_path((model, obs) in model_and_input()) {
                let rescaling = ViterbiDecoder::new(UnderflowPolicy {
                    reset_below: 0.0,
                    ..UnderflowPolicy::default()
                });
                let plain = ViterbiDecoder::new(UnderflowPolicy::disabled());
                for order in [Order::Bigram, Order::Trigram] {
                    let a = rescaling.decode(&model, &obs, order).unwrap();
                    let b = plain.decode(&model, &obs, order).unwrap();
                    prop_assert_eq!(a.states.len(), obs.len());
                    prop_assert_eq!(a.states, b.states);
                }
            }
        }
    }
}
