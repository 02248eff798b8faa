use std::fmt;

/// A typed parameter value. `None` is sent as SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(Option<String>),
    Int(Option<i32>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(Some(value.to_string()))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(Some(value))
    }
}

impl From<Option<String>> for ParamValue {
    fn from(value: Option<String>) -> Self {
        ParamValue::Text(value)
    }
}

impl From<Option<&str>> for ParamValue {
    fn from(value: Option<&str>) -> Self {
        ParamValue::Text(value.map(str::to_string))
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(Some(value))
    }
}

/// Ad-hoc SQL referencing its parameters positionally as `@P1`, `@P2`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuery {
    pub sql: String,
    pub params: Vec<ParamValue>,
}

impl TextQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<ParamValue>) -> Self {
        self.params.push(value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureArg {
    pub name: String,
    pub value: ParamValue,
}

/// Invocation of a stored procedure with named arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureCall {
    pub name: String,
    pub args: Vec<ProcedureArg>,
}

impl ProcedureCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// `name` may be given with or without the leading `@`.
    pub fn arg(
        mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        let name = name.into();
        let name = name.trim_start_matches('@').to_string();
        self.args.push(ProcedureArg {
            name,
            value: value.into(),
        });
        self
    }

    /// Renders the call as a batch binding each argument to `@P<n>`:
    /// `EXEC dbo.sp_x @p_id = @P1, @p_limit = @P2`.
    pub fn to_batch(&self) -> String {
        let mut sql = format!("EXEC {}", self.name);
        for (i, arg) in self.args.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            sql.push_str(&format!("{sep}@{} = @P{}", arg.name, i + 1));
        }
        sql
    }

    pub fn values(&self) -> impl Iterator<Item = &ParamValue> + '_ {
        self.args.iter().map(|a| &a.value)
    }
}

/// Work to run on one shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySpec {
    Text(TextQuery),
    Procedure(ProcedureCall),
}

impl QuerySpec {
    pub fn text(sql: impl Into<String>) -> TextQuery {
        TextQuery::new(sql)
    }

    pub fn procedure(name: impl Into<String>) -> ProcedureCall {
        ProcedureCall::new(name)
    }

    /// SQL batch and its positional parameters, ready for the driver.
    pub fn batch(&self) -> (String, Vec<&ParamValue>) {
        match self {
            QuerySpec::Text(q) => (q.sql.clone(), q.params.iter().collect()),
            QuerySpec::Procedure(p) => (p.to_batch(), p.values().collect()),
        }
    }
}

impl From<TextQuery> for QuerySpec {
    fn from(value: TextQuery) -> Self {
        QuerySpec::Text(value)
    }
}

impl From<ProcedureCall> for QuerySpec {
    fn from(value: ProcedureCall) -> Self {
        QuerySpec::Procedure(value)
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuerySpec::Text(q) => {
                let first = q.sql.split_whitespace().take(6).collect::<Vec<_>>();
                write!(f, "text({} ...)", first.join(" "))
            }
            QuerySpec::Procedure(p) => write!(f, "exec({})", p.name),
        }
    }
}
