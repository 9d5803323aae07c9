//! Indicator expansion of categorical columns.
//!
//! Classes are the sorted distinct values seen at fit time. Output width
//! depends on the class count:
//!
//! | Classes | Columns | Encoding |
//! |---------|---------|----------|
//! | 0 | 0 | nothing |
//! | 1 | 1 | always `0.0` |
//! | 2 | 1 | `1.0` iff the value is the second class |
//! | k >= 3 | k | one-hot |
//!
//! A value not in the class list encodes as all zeros and is reported as
//! unseen.

use serde::{Deserialize, Serialize};

/// Fitted class vocabulary of one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelBinarizer {
    classes: Vec<String>,
}

impl LabelBinarizer {
    /// Learn the sorted class list.
    pub fn fit<'a, I: IntoIterator<Item = &'a str>>(values: I) -> Self {
        let mut classes: Vec<String> = values.into_iter().map(str::to_string).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, value: &str) -> bool {
        self.class_index(value).is_some()
    }

    fn class_index(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Number of output columns.
    pub fn output_width(&self) -> usize {
        match self.classes.len() {
            0 => 0,
            1 | 2 => 1,
            k => k,
        }
    }

    /// Output column names for a source column.
    pub fn output_names(&self, column: &str) -> Vec<String> {
        match self.classes.len() {
            0 => Vec::new(),
            1 => vec![format!("{column}={}", self.classes[0])],
            2 => vec![format!("{column}={}", self.classes[1])],
            _ => self
                .classes
                .iter()
                .map(|c| format!("{column}={c}"))
                .collect(),
        }
    }

    /// Append the encoding of `value` to `out`. Returns `false` if the value
    /// was not seen at fit time (zeros are still written).
    pub fn encode_into(&self, value: &str, out: &mut Vec<f64>) -> bool {
        let start = out.len();
        out.resize(start + self.output_width(), 0.0);

        let Some(idx) = self.class_index(value) else {
            return false;
        };
        match self.classes.len() {
            1 => {}
            2 => {
                if idx == 1 {
                    out[start] = 1.0;
                }
            }
            _ => out[start + idx] = 1.0,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(b: &LabelBinarizer, v: &str) -> (Vec<f64>, bool) {
        let mut out = Vec::new();
        let seen = b.encode_into(v, &mut out);
        (out, seen)
    }

    #[test]
    fn test_classes_sorted_distinct() {
        let b = LabelBinarizer::fit(["fr", "de", "fr", "us"]);
        assert_eq!(b.classes(), &["de", "fr", "us"]);
        assert_eq!(b.output_width(), 3);
        assert_eq!(b.output_names("arg_max_country"), vec![
            "arg_max_country=de",
            "arg_max_country=fr",
            "arg_max_country=us"
        ]);
    }

    #[test]
    fn test_one_hot() {
        let b = LabelBinarizer::fit(["a", "b", "c"]);
        assert_eq!(encode(&b, "b"), (vec![0.0, 1.0, 0.0], true));
    }

    #[test]
    fn test_two_classes_single_column() {
        let b = LabelBinarizer::fit(["yes", "no"]);
        assert_eq!(b.output_width(), 1);
        assert_eq!(b.output_names("c"), vec!["c=yes"]);
        assert_eq!(encode(&b, "yes"), (vec![1.0], true));
        assert_eq!(encode(&b, "no"), (vec![0.0], true));
    }

    #[test]
    fn test_single_class_always_zero() {
        let b = LabelBinarizer::fit(["only", "only"]);
        assert_eq!(b.output_width(), 1);
        assert_eq!(encode(&b, "only"), (vec![0.0], true));
    }

    #[test]
    fn test_no_classes() {
        let b = LabelBinarizer::fit(std::iter::empty());
        assert_eq!(b.output_width(), 0);
        assert!(b.output_names("c").is_empty());
    }

    #[test]
    fn test_unseen_value_zero_filled() {
        let b = LabelBinarizer::fit(["a", "b", "c"]);
        assert_eq!(encode(&b, "z"), (vec![0.0, 0.0, 0.0], false));
        assert!(!b.contains("z"));
    }
}
