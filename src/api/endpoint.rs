use serde::Serialize;

pub type Endpoint = str;

pub const GETJP: &Endpoint = "/getjp";

/* Query group 801/170: all current readings */
#[derive(Debug, Serialize)]
pub struct Query {
    #[serde(rename = "801")]
    pub group: QueryGroup,
}

#[derive(Debug, Serialize)]
pub struct QueryGroup {
    #[serde(rename = "170")]
    pub readings: Option<()>,
}

pub const GETJP_QUERY: Query = Query {
    group: QueryGroup { readings: None },
};
