//! This module defines an abstract representation of a MinPol instance
//! together with its two textual forms: the positional plain-text layout
//! users write by hand, and the MiniZinc data file consumed by the model.

use std::{fmt, str::FromStr};

use serde::{Serialize, Deserialize};

use crate::error::{MinPolError, MinPolResult};

/// Number of resistance levels per opinion (low, medium, high).
pub const RESISTANCE_LEVELS: usize = 3;

/// The plain-text document the example instance is parsed from.
pub const EXAMPLE_TXT: &str = "10
3
3,3,4
0.297,0.673,0.809
1,2,0
0,3,0
2,1,1
25
5";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpec {
    /// Total number of people
    pub n: u64,
    /// Number of opinions
    pub m: usize,
    /// People holding each opinion
    pub p: Vec<i64>,
    /// Value associated with each opinion
    pub v: Vec<f64>,
    /// (low, medium, high) resistance counts for each opinion
    pub resistance: Vec<[i64; RESISTANCE_LEVELS]>,
    /// Maximum total cost
    pub ct: f64,
    /// Maximum number of moves
    #[serde(rename = "maxMovs")]
    pub max_movs: i64,
}

impl InstanceSpec {

    /// Parses the positional layout:
    ///
    /// ```text
    /// n
    /// m
    /// p_1,...,p_m
    /// v_1,...,v_m
    /// low,medium,high      (m lines)
    /// ct
    /// maxMovs
    /// ```
    ///
    /// Anything after the `maxMovs` line is ignored.
    pub fn parse_txt(content: &str) -> MinPolResult<Self> {
        let lines = Lines(content.lines().map(str::trim).collect());

        let n = lines.scalar::<u64>(0, "n")?;
        let m = lines.scalar::<usize>(1, "m")?;
        let p = lines.list::<i64>(2, "p")?;
        let v = lines.list::<f64>(3, "v")?;

        let mut resistance = Vec::with_capacity(m.min(lines.0.len()));
        for i in 0..m {
            let idx = 4 + i;
            let row = lines.list::<i64>(idx, "s")?;
            let row: [i64; RESISTANCE_LEVELS] = row.try_into().map_err(|row: Vec<i64>| {
                MinPolError::structure(
                    idx + 1,
                    format!("resistance row {} has {} values, expected {RESISTANCE_LEVELS}", i + 1, row.len()),
                )
            })?;
            resistance.push(row);
        }

        let ct = lines.scalar::<f64>(4 + m, "ct")?;
        let max_movs = lines.scalar::<i64>(5 + m, "maxMovs")?;

        let instance = InstanceSpec { n, m, p, v, resistance, ct, max_movs };
        instance.validate()?;
        Ok(instance)
    }

    /// Checks the dimensional invariants. Errors point at the line the
    /// offending field occupies in the plain-text layout.
    pub fn validate(&self) -> MinPolResult<()> {
        if self.n == 0 {
            return Err(MinPolError::value("n", 1, "0", "must be positive"));
        }
        if self.m == 0 {
            return Err(MinPolError::value("m", 2, "0", "must be positive"));
        }
        if self.p.len() != self.m {
            return Err(MinPolError::structure(3, format!("p has {} values but m = {}", self.p.len(), self.m)));
        }
        if self.v.len() != self.m {
            return Err(MinPolError::structure(4, format!("v has {} values but m = {}", self.v.len(), self.m)));
        }
        if self.resistance.len() != self.m {
            return Err(MinPolError::structure(
                5,
                format!("{} resistance rows given but m = {}", self.resistance.len(), self.m),
            ));
        }
        if let Some((i, x)) = self.v.iter().enumerate().find(|(_, x)| !x.is_finite()) {
            return Err(MinPolError::value("v", 4, &fmt_float(*x), format!("value {} is not finite", i + 1)));
        }
        if !self.ct.is_finite() {
            return Err(MinPolError::value("ct", 5 + self.m, &fmt_float(self.ct), "not finite"));
        }
        Ok(())
    }

    /// Renders the instance back into the positional plain-text layout.
    pub fn to_txt(&self) -> String {
        let mut lines = vec![
            self.n.to_string(),
            self.m.to_string(),
            join(self.p.iter(), ","),
            join(self.v.iter().map(|x| fmt_float(*x)), ","),
        ];
        lines.extend(self.resistance.iter().map(|row| join(row.iter(), ",")));
        lines.push(fmt_float(self.ct));
        lines.push(self.max_movs.to_string());

        let mut txt = lines.join("\n");
        txt.push('\n');
        txt
    }

    /// Renders the MiniZinc data file, one assignment per parameter.
    pub fn to_dzn(&self) -> String {
        let flat = self.resistance.iter().flatten();
        let mut dzn = String::new();
        dzn.push_str(&format!("n = {};\n", self.n));
        dzn.push_str(&format!("m = {};\n", self.m));
        dzn.push_str(&format!("p = [{}];\n", join(self.p.iter(), ", ")));
        dzn.push_str(&format!("v = [{}];\n", join(self.v.iter().map(|x| fmt_float(*x)), ", ")));
        dzn.push_str(&format!("s = array2d(1..{}, 1..{RESISTANCE_LEVELS}, [{}]);\n", self.m, join(flat, ", ")));
        dzn.push_str(&format!("ct = {};\n", fmt_float(self.ct)));
        dzn.push_str(&format!("maxMovs = {};\n", self.max_movs));
        dzn
    }

    /// Multi-line, human-readable account of every field.
    pub fn summary(&self) -> String {
        self.to_string()
    }

    #[cfg(test)]
    pub fn example() -> Self {
        InstanceSpec {
            n: 10,
            m: 3,
            p: vec![3, 3, 4],
            v: vec![0.297, 0.673, 0.809],
            resistance: vec![[1, 2, 0], [0, 3, 0], [2, 1, 1]],
            ct: 25.0,
            max_movs: 5,
        }
    }
}

impl fmt::Display for InstanceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  n (people): {}", self.n)?;
        writeln!(f, "  m (opinions): {}", self.m)?;
        writeln!(f, "  p (distribution): [{}]", join(self.p.iter(), ", "))?;
        writeln!(f, "  v (opinion values): [{}]", join(self.v.iter().map(|x| fmt_float(*x)), ", "))?;
        writeln!(f, "  s (resistances):")?;
        for (i, [low, medium, high]) in self.resistance.iter().enumerate() {
            writeln!(f, "    opinion {}: low={low}, medium={medium}, high={high}", i + 1)?;
        }
        writeln!(f, "  ct (max cost): {}", fmt_float(self.ct))?;
        write!(f, "  maxMovs (max moves): {}", self.max_movs)
    }
}

/// Shortest round-trip rendering, always with a fractional part or an
/// exponent so MiniZinc reads it as a float (`25` becomes `25.0`).
pub fn fmt_float(x: f64) -> String {
    format!("{x:?}")
}

fn join<T: ToString>(items: impl Iterator<Item = T>, sep: &str) -> String {
    items.map(|x| x.to_string()).collect::<Vec<_>>().join(sep)
}

/// Trimmed lines of a plain-text instance, indexed from 0.
struct Lines<'a>(Vec<&'a str>);

impl<'a> Lines<'a> {
    fn get(&self, idx: usize, field: &'static str) -> MinPolResult<&'a str> {
        self.0.get(idx).copied().ok_or_else(|| {
            MinPolError::structure(
                idx + 1,
                format!("expected {field}, but the document has only {} lines", self.0.len()),
            )
        })
    }

    fn scalar<T>(&self, idx: usize, field: &'static str) -> MinPolResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let token = self.get(idx, field)?;
        token.parse().map_err(|e| MinPolError::value(field, idx + 1, token, e))
    }

    fn list<T>(&self, idx: usize, field: &'static str) -> MinPolResult<Vec<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(idx, field)?
            .split(',')
            .map(str::trim)
            .map(|token| token.parse().map_err(|e| MinPolError::value(field, idx + 1, token, e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn parses_the_example_document() {
        let instance = InstanceSpec::parse_txt(EXAMPLE_TXT).unwrap();
        assert_eq!(instance, InstanceSpec::example());
    }

    #[test]
    fn renders_the_example_data_file() {
        let dzn = InstanceSpec::example().to_dzn();
        assert_eq!(dzn, "n = 10;\n\
                         m = 3;\n\
                         p = [3, 3, 4];\n\
                         v = [0.297, 0.673, 0.809];\n\
                         s = array2d(1..3, 1..3, [1, 2, 0, 0, 3, 0, 2, 1, 1]);\n\
                         ct = 25.0;\n\
                         maxMovs = 5;\n");
    }

    #[test]
    fn statements_come_in_a_fixed_order_for_any_m() {
        for m in 1..=20 {
            let instance = InstanceSpec {
                n: 2 * m as u64,
                m,
                p: vec![2; m],
                v: (0..m).map(|i| i as f64 / 10.0).collect(),
                resistance: vec![[1, 1, 0]; m],
                ct: 7.5,
                max_movs: 3,
            };
            let dzn = InstanceSpec::parse_txt(&instance.to_txt()).unwrap().to_dzn();
            let names: Vec<&str> = dzn.lines().map(|l| l.split(" = ").next().unwrap()).collect();
            assert_eq!(names, ["n", "m", "p", "v", "s", "ct", "maxMovs"]);
            assert!(dzn.contains(&format!("s = array2d(1..{m}, 1..3, [")));
        }
    }

    #[test]
    fn whitespace_around_tokens_is_ignored() {
        let content = "  10 \n3\n 3 , 3,4\n0.297, 0.673 ,0.809\n1,2,0\n0,3,0\n2, 1, 1\n 25 \n5\n\n";
        assert_eq!(InstanceSpec::parse_txt(content).unwrap(), InstanceSpec::example());
    }

    #[test]
    fn lines_after_max_movs_are_ignored() {
        let content = format!("{EXAMPLE_TXT}\nextra\nlines");
        assert!(InstanceSpec::parse_txt(&content).is_ok());
    }

    #[test]
    fn missing_lines_are_structural_errors() {
        let truncated: Vec<&str> = EXAMPLE_TXT.lines().take(8).collect();
        match InstanceSpec::parse_txt(&truncated.join("\n")) {
            Err(MinPolError::MalformedStructure { line, message }) => {
                assert_eq!(line, 9);
                assert!(message.contains("maxMovs"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(InstanceSpec::parse_txt(""), Err(MinPolError::MalformedStructure { line: 1, .. })));
    }

    #[test]
    fn short_p_vector_is_rejected() {
        let content = EXAMPLE_TXT.replace("3,3,4", "3,3");
        assert!(matches!(
            InstanceSpec::parse_txt(&content),
            Err(MinPolError::MalformedStructure { line: 3, .. })
        ));
    }

    #[test]
    fn resistance_rows_need_three_values() {
        let content = EXAMPLE_TXT.replace("0,3,0", "0,3");
        assert!(matches!(
            InstanceSpec::parse_txt(&content),
            Err(MinPolError::MalformedStructure { line: 6, .. })
        ));
    }

    #[test]
    fn non_numeric_cost_names_the_field() {
        let content = EXAMPLE_TXT.replace("\n25\n", "\nmucho\n");
        match InstanceSpec::parse_txt(&content) {
            Err(MinPolError::MalformedValue { field, line, token, .. }) => {
                assert_eq!(field, "ct");
                assert_eq!(line, 8);
                assert_eq!(token, "mucho");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn float_where_integer_expected_is_a_value_error() {
        let content = EXAMPLE_TXT.replace("3,3,4", "3,3.5,4");
        assert!(matches!(
            InstanceSpec::parse_txt(&content),
            Err(MinPolError::MalformedValue { field: "p", line: 3, .. })
        ));
    }

    #[test]
    fn dimensions_must_be_positive() {
        let content = "0\n1\n0\n0.5\n0,0,0\n1\n1";
        assert!(matches!(InstanceSpec::parse_txt(content), Err(MinPolError::MalformedValue { field: "n", .. })));
        let empty = InstanceSpec { m: 0, p: vec![], v: vec![], resistance: vec![], ..InstanceSpec::example() };
        assert!(matches!(empty.validate(), Err(MinPolError::MalformedValue { field: "m", .. })));
    }

    #[test]
    fn non_finite_cost_is_rejected() {
        let content = EXAMPLE_TXT.replace("\n25\n", "\ninf\n");
        assert!(matches!(InstanceSpec::parse_txt(&content), Err(MinPolError::MalformedValue { field: "ct", .. })));
    }

    #[test]
    fn integral_cost_is_written_as_float() {
        let mut instance = InstanceSpec::example();
        instance.ct = 1e-5;
        assert!(instance.to_dzn().contains("ct = 1e-5;\n"));
        instance.ct = 100.0;
        assert!(instance.to_dzn().contains("ct = 100.0;\n"));
    }

    #[test]
    fn floats_survive_txt_rendering() {
        let mut instance = InstanceSpec::example();
        instance.v = vec![0.1 + 0.2, 1e-7, 2.0 / 3.0];
        instance.ct = 1234.5678e3;
        let read = InstanceSpec::parse_txt(&instance.to_txt()).unwrap();
        for (a, b) in read.v.iter().zip(&instance.v) {
            assert_float_eq!(*a, *b, ulps <= 1);
        }
        assert_float_eq!(read.ct, instance.ct, ulps <= 1);
    }

    #[test]
    fn txt_rendering_parses_back() {
        let instance = InstanceSpec::example();
        assert_eq!(InstanceSpec::parse_txt(&instance.to_txt()).unwrap(), instance);
    }

    #[test]
    fn json_uses_the_model_parameter_names() {
        let json = serde_json::to_value(InstanceSpec::example()).unwrap();
        assert_eq!(json["maxMovs"], 5);
        assert_eq!(json["resistance"][2], serde_json::json!([2, 1, 1]));
    }

    #[test]
    fn summary_lists_every_resistance_row() {
        let summary = InstanceSpec::example().summary();
        assert!(summary.contains("opinion 3: low=2, medium=1, high=1"));
        assert!(summary.contains("ct (max cost): 25.0"));
    }
}
