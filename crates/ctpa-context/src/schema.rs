//! 分类模式
//!
//! 每行 `值,标签,表达式`，表达式使用 `DISEASE_STATE`、`CERTAINTY_STATE`、`ACUTE_STATE`
//! 三个状态变量，支持整数、比较运算、`and`/`or`/`not` 和括号。按文件顺序第一个成立的行给出分类值。

use std::fmt;

use ctpa_core::{CtpaError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::delimited::read_rows;

/// 状态变量
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StateVariable {
    Disease,   // 是否存在
    Certainty, // 确定程度
    Acute,     // 急性/既往
}

impl StateVariable {
    pub const ALL: [StateVariable; 3] = [StateVariable::Disease, StateVariable::Certainty, StateVariable::Acute];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "DISEASE_STATE" => Some(StateVariable::Disease),
            "CERTAINTY_STATE" => Some(StateVariable::Certainty),
            "ACUTE_STATE" => Some(StateVariable::Acute),
            _ => None,
        }
    }

    /// 规则名形如 `DISEASE_STATE_RULE`
    pub fn from_rule_name(name: &str) -> Option<Self> {
        let upper = name.to_uppercase();
        Self::from_name(upper.strip_suffix("_RULE").unwrap_or(&upper))
    }

    pub fn name(&self) -> &'static str {
        match self {
            StateVariable::Disease => "DISEASE_STATE",
            StateVariable::Certainty => "CERTAINTY_STATE",
            StateVariable::Acute => "ACUTE_STATE",
        }
    }
}

impl fmt::Display for StateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// 模式表达式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Var(StateVariable),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// 求值，比较结果为 1/0，非零即真
    pub fn eval(&self, states: &dyn Fn(StateVariable) -> i64) -> i64 {
        match self {
            Expr::Int(v) => *v,
            Expr::Var(var) => states(*var),
            Expr::Compare(op, lhs, rhs) => {
                let (l, r) = (lhs.eval(states), rhs.eval(states));
                let result = match op {
                    CompareOp::Eq => l == r,
                    CompareOp::Ne => l != r,
                    CompareOp::Lt => l < r,
                    CompareOp::Le => l <= r,
                    CompareOp::Gt => l > r,
                    CompareOp::Ge => l >= r,
                };
                i64::from(result)
            }
            Expr::And(lhs, rhs) => i64::from(lhs.eval(states) != 0 && rhs.eval(states) != 0),
            Expr::Or(lhs, rhs) => i64::from(lhs.eval(states) != 0 || rhs.eval(states) != 0),
            Expr::Not(inner) => i64::from(inner.eval(states) == 0),
        }
    }

    pub fn parse(source: &str) -> std::result::Result<Self, String> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(format!("多余的符号 {:?}", token)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Ident(String),
    Op(CompareOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let next = chars.get(i + 1).copied();
        match c {
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '=' if next == Some('=') => {
                tokens.push(Token::Op(CompareOp::Eq));
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Op(CompareOp::Ne));
                i += 1;
            }
            '<' | '>' => {
                let inclusive = next == Some('=');
                let op = match (c, inclusive) {
                    ('<', false) => CompareOp::Lt,
                    ('<', true) => CompareOp::Le,
                    ('>', false) => CompareOp::Gt,
                    _ => CompareOp::Ge,
                };
                tokens.push(Token::Op(op));
                if inclusive {
                    i += 1;
                }
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal.parse().map_err(|_| format!("无效整数 '{}'", literal))?;
                tokens.push(Token::Int(value));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.to_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Ident(word),
                });
                continue;
            }
            other => return Err(format!("无法识别的字符 '{}'", other)),
        }
        i += 1;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> std::result::Result<Expr, String> {
        let mut expr = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            expr = Expr::Or(Box::new(expr), Box::new(self.parse_and()?));
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> std::result::Result<Expr, String> {
        let mut expr = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            expr = Expr::And(Box::new(expr), Box::new(self.parse_not()?));
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> std::result::Result<Expr, String> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> std::result::Result<Expr, String> {
        let lhs = self.parse_operand()?;
        if let Some(Token::Op(op)) = self.peek().cloned() {
            self.advance();
            let rhs = self.parse_operand()?;
            return Ok(Expr::Compare(op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_operand(&mut self) -> std::result::Result<Expr, String> {
        match self.advance() {
            Some(Token::Int(v)) => Ok(Expr::Int(v)),
            Some(Token::Ident(name)) => StateVariable::from_name(&name)
                .map(Expr::Var)
                .ok_or_else(|| format!("未知状态变量 '{}'", name)),
            Some(Token::LParen) => {
                let expr = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err("缺少右括号".to_string()),
                }
            }
            Some(token) => Err(format!("意外的符号 {:?}", token)),
            None => Err("表达式不完整".to_string()),
        }
    }
}

/// 模式中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub value: i64,
    pub label: String,
    pub rule: Expr,
}

/// 分类模式
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    entries: Vec<SchemaEntry>,
}

impl Schema {
    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 返回第一个成立的模式行
    pub fn assign(&self, states: &dyn Fn(StateVariable) -> i64) -> Option<&SchemaEntry> {
        self.entries.iter().find(|entry| entry.rule.eval(states) != 0)
    }

    /// 解析模式文件
    pub fn from_csv(resource: &str, content: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for row in read_rows(resource, content, b',')? {
            let line_no = row.line;
            // 表达式占据第二列之后的全部内容
            let [value, label, rule @ ..] = row.cells.as_slice() else {
                return Err(CtpaError::parse(resource, line_no, "模式行需要 值,标签,表达式 三列"));
            };
            let rule = rule.join(",");
            if rule.trim().is_empty() {
                return Err(CtpaError::parse(resource, line_no, "模式行需要 值,标签,表达式 三列"));
            }
            let value: i64 = value
                .parse()
                .map_err(|_| CtpaError::parse(resource, line_no, format!("模式值 '{}' 不是整数", value)))?;
            let rule = Expr::parse(&rule).map_err(|e| CtpaError::parse(resource, line_no, e))?;
            entries.push(SchemaEntry {
                value,
                label: label.to_string(),
                rule,
            });
        }

        if entries.is_empty() {
            return Err(CtpaError::KnowledgeBase(format!("模式 {} 为空", resource)));
        }
        debug!("Loaded {} schema entries from {}", entries.len(), resource);
        Ok(Self { entries })
    }
}
