use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use tracing::{debug, trace};

use super::DataSourceError;

/// Key → `(text, weight)` candidates, the output of [`NgramTable::finish`].
pub type PredictionPairs = BTreeMap<String, Vec<(String, u32)>>;

/// Prediction pairs derived from an n-gram frequency list.
///
/// A bigram `a b` yields `a → b`; a single word yields every
/// prefix → suffix split at character boundaries. The same pair seen twice
/// keeps the larger weight.
#[derive(Debug, Default)]
pub struct NgramTable {
    entries: PredictionPairs,
    filter_weight: Option<u32>,
}

impl NgramTable {
    /// Pairs from lines weighing less than `filter_weight` are dropped.
    pub fn new(filter_weight: Option<u32>) -> Self {
        Self {
            entries: PredictionPairs::new(),
            filter_weight,
        }
    }

    /// Read `ngram\tweight` lines.
    pub fn read<R: BufRead>(&mut self, reader: R) -> Result<(), DataSourceError> {
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            self.add_line(index + 1, &line)?;
        }
        Ok(())
    }

    fn add_line(&mut self, line_no: usize, line: &str) -> Result<(), DataSourceError> {
        let parse_error = |reason: String| DataSourceError::Parse {
            line: line_no,
            reason,
        };
        let (ngram, weight) = line
            .split_once('\t')
            .ok_or_else(|| parse_error(format!("expected 'ngram<TAB>weight', got '{line}'")))?;
        let weight: u32 = weight
            .trim()
            .parse()
            .map_err(|_| parse_error(format!("invalid weight '{weight}'")))?;
        if self.filter_weight.is_some_and(|min| weight < min) {
            return Ok(());
        }

        match ngram.split_once(' ') {
            Some((first, second)) => {
                if second.contains(' ') {
                    return Err(parse_error(format!("more than two words in '{ngram}'")));
                }
                if second != "$" {
                    self.add(first, second, weight);
                }
            }
            None => {
                let boundaries: Vec<usize> =
                    ngram.char_indices().map(|(i, _)| i).skip(1).collect();
                for split in boundaries {
                    let (prefix, suffix) = ngram.split_at(split);
                    self.add(prefix, suffix, weight);
                }
            }
        }
        Ok(())
    }

    fn add(&mut self, key: &str, text: &str, weight: u32) {
        let candidates = self.entries.entry(key.to_string()).or_default();
        match candidates.iter_mut().find(|(t, _)| t == text) {
            Some((_, w)) if *w < weight => {
                trace!(key, text, weight, "updated");
                *w = weight;
            }
            Some(_) => {}
            None => candidates.push((text.to_string(), weight)),
        }
    }

    /// Per-key candidates sorted by weight (descending, stable), keeping at
    /// most `max_candidates` when given.
    pub fn finish(mut self, max_candidates: Option<usize>) -> PredictionPairs {
        for candidates in self.entries.values_mut() {
            candidates.sort_by(|a, b| b.1.cmp(&a.1));
            if let Some(max) = max_candidates {
                candidates.truncate(max);
            }
        }
        debug!(keys = self.entries.len(), "prepared prediction data");
        self.entries
    }
}

/// Write `key\ttext\tweight` lines, the build input format.
pub fn write_triples<W: Write>(out: &mut W, data: &PredictionPairs) -> io::Result<()> {
    for (key, candidates) in data {
        for (text, weight) in candidates {
            writeln!(out, "{key}\t{text}\t{weight}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::parse_triples;

    fn table(input: &str, filter_weight: Option<u32>) -> NgramTable {
        let mut table = NgramTable::new(filter_weight);
        table.read(input.as_bytes()).unwrap();
        table
    }

    #[test]
    fn test_bigrams() {
        let data = table("我 们\t10\n我 的\t20\n我 $\t99\n", None).finish(None);
        assert_eq!(
            data["我"],
            vec![("的".to_string(), 20), ("们".to_string(), 10)]
        );
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_word_split_at_char_boundaries() {
        let data = table("你好吗\t5\n", None).finish(None);
        assert_eq!(data["你"], vec![("好吗".to_string(), 5)]);
        assert_eq!(data["你好"], vec![("吗".to_string(), 5)]);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_single_char_word_adds_nothing() {
        assert!(table("我\t5\n", None).finish(None).is_empty());
    }

    #[test]
    fn test_duplicate_keeps_max_weight() {
        let data = table("a b\t3\na b\t7\na b\t5\n", None).finish(None);
        assert_eq!(data["a"], vec![("b".to_string(), 7)]);
    }

    #[test]
    fn test_filter_weight() {
        let data = table("a b\t3\na c\t7\n", Some(5)).finish(None);
        assert_eq!(data["a"], vec![("c".to_string(), 7)]);
    }

    #[test]
    fn test_max_candidates() {
        let data = table("a b\t1\na c\t3\na d\t2\n", None).finish(Some(2));
        assert_eq!(
            data["a"],
            vec![("c".to_string(), 3), ("d".to_string(), 2)]
        );
    }

    #[test]
    fn test_bad_lines() {
        let mut t = NgramTable::new(None);
        assert!(matches!(
            t.read("a b\t1\nno-weight\n".as_bytes()),
            Err(DataSourceError::Parse { line: 2, .. })
        ));
        let mut t = NgramTable::new(None);
        assert!(t.read("a b c\t1\n".as_bytes()).is_err());
        let mut t = NgramTable::new(None);
        assert!(t.read("a b\tmany\n".as_bytes()).is_err());
    }

    #[test]
    fn test_output_feeds_build_input() {
        let data = table("我 们\t10\n我 的\t20\n", None).finish(None);
        let mut out = Vec::new();
        write_triples(&mut out, &data).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "我\t的\t20\n我\t们\t10\n");

        let raw = parse_triples(&text).unwrap();
        assert_eq!(raw["我"].len(), 2);
        assert_eq!(raw["我"][0].text, "的");
    }
}
