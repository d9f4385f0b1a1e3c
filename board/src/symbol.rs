use serde::{Deserialize, Serialize};
use std::fmt;

/// A single argument of a solver atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Term {
    Number(i32),
    Name(String),
}

impl Term {
    fn label(&self) -> String {
        match self {
            Term::Number(n) => n.to_string(),
            Term::Name(s) => s.clone(),
        }
    }
}

impl From<i32> for Term {
    fn from(n: i32) -> Self {
        Term::Number(n)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Name(s.to_string())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Name(s)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Number(n) => write!(f, "{}", n),
            Term::Name(s) => write!(f, "{}", s),
        }
    }
}

/// An untyped atom as it crosses the solver boundary: `name(args...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Term>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        write!(f, "(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactError {
    #[error("argument {index} of {name}/{arity} should be a {expected}")]
    ArgumentType {
        name: String,
        arity: usize,
        index: usize,
        expected: &'static str,
    },
}

/// Typed view of the atoms this crate cares about.
///
/// All coordinates here are 1-indexed, as the solver program sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    /// `dim(n)`: one row/column index of the board.
    Dim(i32),
    /// `barrier(x, y, dx, dy)`: a wall leaving cell (x, y) in direction (dx, dy).
    Barrier { x: i32, y: i32, dx: i32, dy: i32 },
    /// `available_target(color, symbol, x, y)`
    AvailableTarget {
        color: String,
        symbol: String,
        x: i32,
        y: i32,
    },
    /// `initial_pos(robot, x, y)`
    InitialPos { robot: String, x: i32, y: i32 },
    /// `pos(robot, x, y, t)`: the external asserting a robot's position at step t.
    Position { robot: String, x: i32, y: i32, t: i32 },
    /// `target(robot, x, y)`: the external naming the goal of a search.
    Goal { robot: String, x: i32, y: i32 },
    /// `horizon(h)`: the external marking the active horizon.
    Horizon(i32),
    /// `move(robot, a, b, t)`: whether (a, b) is a destination or a step
    /// depends on the backend's move encoding.
    Move { robot: String, a: i32, b: i32, t: i32 },
}

struct ArgReader<'a> {
    symbol: &'a Symbol,
}

impl<'a> ArgReader<'a> {
    fn error(&self, index: usize, expected: &'static str) -> FactError {
        FactError::ArgumentType {
            name: self.symbol.name.clone(),
            arity: self.symbol.arity(),
            index,
            expected,
        }
    }

    fn number(&self, index: usize) -> Result<i32, FactError> {
        match &self.symbol.args[index] {
            Term::Number(n) => Ok(*n),
            Term::Name(_) => Err(self.error(index, "number")),
        }
    }

    fn name(&self, index: usize) -> Result<String, FactError> {
        match &self.symbol.args[index] {
            Term::Name(s) => Ok(s.clone()),
            Term::Number(_) => Err(self.error(index, "name")),
        }
    }

    fn label(&self, index: usize) -> String {
        self.symbol.args[index].label()
    }
}

impl Fact {
    /// Decodes one atom. Atoms this crate does not know (by name and arity)
    /// decode to `None`.
    pub fn decode(symbol: &Symbol) -> Result<Option<Fact>, FactError> {
        let args = ArgReader { symbol };
        let fact = match (symbol.name.as_str(), symbol.arity()) {
            ("dim", 1) => Fact::Dim(args.number(0)?),
            ("barrier", 4) => Fact::Barrier {
                x: args.number(0)?,
                y: args.number(1)?,
                dx: args.number(2)?,
                dy: args.number(3)?,
            },
            ("available_target", 4) => Fact::AvailableTarget {
                color: args.label(0),
                symbol: args.label(1),
                x: args.number(2)?,
                y: args.number(3)?,
            },
            ("initial_pos", 3) => Fact::InitialPos {
                robot: args.name(0)?,
                x: args.number(1)?,
                y: args.number(2)?,
            },
            ("pos", 4) => Fact::Position {
                robot: args.name(0)?,
                x: args.number(1)?,
                y: args.number(2)?,
                t: args.number(3)?,
            },
            ("target", 3) => Fact::Goal {
                robot: args.name(0)?,
                x: args.number(1)?,
                y: args.number(2)?,
            },
            ("horizon", 1) => Fact::Horizon(args.number(0)?),
            ("move", 4) => Fact::Move {
                robot: args.name(0)?,
                a: args.number(1)?,
                b: args.number(2)?,
                t: args.number(3)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(fact))
    }

    /// Decodes every known atom of a model, skipping the rest.
    pub fn decode_all<'a, I>(symbols: I) -> Result<Vec<Fact>, FactError>
    where
        I: IntoIterator<Item = &'a Symbol>,
    {
        let mut facts = Vec::new();
        for symbol in symbols {
            if let Some(fact) = Fact::decode(symbol)? {
                facts.push(fact);
            }
        }
        Ok(facts)
    }

    pub fn to_symbol(&self) -> Symbol {
        match self {
            Fact::Dim(n) => Symbol::new("dim", vec![(*n).into()]),
            Fact::Barrier { x, y, dx, dy } => Symbol::new(
                "barrier",
                vec![(*x).into(), (*y).into(), (*dx).into(), (*dy).into()],
            ),
            Fact::AvailableTarget {
                color,
                symbol,
                x,
                y,
            } => Symbol::new(
                "available_target",
                vec![
                    color.as_str().into(),
                    symbol.as_str().into(),
                    (*x).into(),
                    (*y).into(),
                ],
            ),
            Fact::InitialPos { robot, x, y } => Symbol::new(
                "initial_pos",
                vec![robot.as_str().into(), (*x).into(), (*y).into()],
            ),
            Fact::Position { robot, x, y, t } => Symbol::new(
                "pos",
                vec![robot.as_str().into(), (*x).into(), (*y).into(), (*t).into()],
            ),
            Fact::Goal { robot, x, y } => Symbol::new(
                "target",
                vec![robot.as_str().into(), (*x).into(), (*y).into()],
            ),
            Fact::Horizon(h) => Symbol::new("horizon", vec![(*h).into()]),
            Fact::Move { robot, a, b, t } => Symbol::new(
                "move",
                vec![robot.as_str().into(), (*a).into(), (*b).into(), (*t).into()],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_barrier() {
        let symbol = Symbol::new("barrier", vec![3.into(), 4.into(), 1.into(), 0.into()]);
        let fact = Fact::decode(&symbol).unwrap();
        assert_eq!(
            fact,
            Some(Fact::Barrier {
                x: 3,
                y: 4,
                dx: 1,
                dy: 0
            })
        );
    }

    #[test]
    fn test_unknown_atoms_are_skipped() {
        let aux = Symbol::new("reach", vec!["red".into(), 1.into()]);
        assert_eq!(Fact::decode(&aux).unwrap(), None);

        // known name, unknown arity
        let dim = Symbol::new("dim", vec![1.into(), 2.into()]);
        assert_eq!(Fact::decode(&dim).unwrap(), None);
    }

    #[test]
    fn test_wrong_argument_type() {
        let symbol = Symbol::new("initial_pos", vec![1.into(), 1.into(), 1.into()]);
        let err = Fact::decode(&symbol).unwrap_err();
        assert_eq!(
            err,
            FactError::ArgumentType {
                name: "initial_pos".to_string(),
                arity: 3,
                index: 0,
                expected: "name",
            }
        );
    }

    #[test]
    fn test_target_symbol_accepts_numbers() {
        let symbol = Symbol::new(
            "available_target",
            vec!["red".into(), 7.into(), 2.into(), 5.into()],
        );
        let fact = Fact::decode(&symbol).unwrap().unwrap();
        assert_eq!(
            fact,
            Fact::AvailableTarget {
                color: "red".to_string(),
                symbol: "7".to_string(),
                x: 2,
                y: 5
            }
        );
    }

    #[test]
    fn test_symbol_from_json() {
        let json = r#"[{"name":"initial_pos","args":["blue",1,16]},{"name":"dim","args":[16]}]"#;
        let symbols: Vec<Symbol> = serde_json::from_str(json).unwrap();
        let facts = Fact::decode_all(&symbols).unwrap();
        assert_eq!(
            facts,
            vec![
                Fact::InitialPos {
                    robot: "blue".to_string(),
                    x: 1,
                    y: 16
                },
                Fact::Dim(16)
            ]
        );
    }

    #[test]
    fn test_display() {
        let fact = Fact::Position {
            robot: "red".to_string(),
            x: 2,
            y: 3,
            t: 0,
        };
        assert_eq!(fact.to_symbol().to_string(), "pos(red,2,3,0)");
        assert_eq!(Fact::Horizon(4).to_symbol().to_string(), "horizon(4)");
    }
}
