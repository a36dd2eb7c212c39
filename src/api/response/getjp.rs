use serde::Deserialize;
use serde_json::{Map, Value};

/* Query group 170: current readings keyed by field code */
#[derive(Deserialize)]
pub struct Group {
    #[serde(rename = "170")]
    pub readings: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct GetJp {
    #[serde(rename = "801")]
    pub group: Group,
}
