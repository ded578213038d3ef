use super::{SerializerError, UnitSerializer};
use crate::model::unit::ModelUnit;
use serde::Deserialize;
use serde_json::{json, Value};

/// Version tag written into every storage form.
pub const STORAGE_FORMAT_VERSION: u64 = 1;

const FORMAT_FIELD: &str = "$format";
const INTERFACE_FIELD: &str = "$interface";
const UNIT_FIELD: &str = "unit";

/// `serde_json` serializer for [`ModelUnit`] documents.
///
/// Storage form: `{"$format": 1, "$interface": bool, "unit": <ModelUnit>}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonUnitSerializer;

impl UnitSerializer for JsonUnitSerializer {
    type Unit = ModelUnit;

    fn to_storage_form(
        &self,
        unit: &ModelUnit,
        interface_only: bool,
    ) -> Result<Value, SerializerError> {
        let body = if interface_only {
            serde_json::to_value(unit.interface())?
        } else {
            serde_json::to_value(unit)?
        };
        Ok(json!({
            FORMAT_FIELD: STORAGE_FORMAT_VERSION,
            INTERFACE_FIELD: interface_only,
            UNIT_FIELD: body,
        }))
    }

    fn from_storage_form(&self, data: &Value) -> Result<ModelUnit, SerializerError> {
        let object = data
            .as_object()
            .ok_or_else(|| SerializerError::new("stored unit is not a JSON object"))?;

        match object.get(FORMAT_FIELD).and_then(Value::as_u64) {
            Some(STORAGE_FORMAT_VERSION) => {}
            Some(other) => {
                return Err(SerializerError::new(format!(
                    "unsupported unit storage format {other}"
                )))
            }
            None => {
                return Err(SerializerError::new(format!(
                    "stored unit has no `{FORMAT_FIELD}` tag"
                )))
            }
        }

        let body = object
            .get(UNIT_FIELD)
            .ok_or_else(|| SerializerError::new(format!("stored unit has no `{UNIT_FIELD}`")))?;
        let unit = ModelUnit::deserialize(body)
            .map_err(|err| SerializerError::new(format!("cannot read unit: {err}")))?;
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::JsonUnitSerializer;
    use crate::model::unit::{ModelUnit, UnitNode};
    use crate::serializer::UnitSerializer;
    use serde_json::json;

    fn unit() -> ModelUnit {
        ModelUnit::new("Shop", "EntityUnit")
            .with_node(UnitNode::public("Customer", "Entity"))
            .with_node(UnitNode::private("Audit", "Entity").with_property("retention", 30))
    }

    #[test]
    fn full_form_reads_back_unchanged() {
        let serializer = JsonUnitSerializer;
        let data = serializer.to_storage_form(&unit(), false).unwrap();
        assert_eq!(data["$interface"], json!(false));
        assert_eq!(serializer.from_storage_form(&data).unwrap(), unit());
    }

    #[test]
    fn interface_form_is_smaller() {
        let serializer = JsonUnitSerializer;
        let full = serializer.to_storage_form(&unit(), false).unwrap();
        let interface = serializer.to_storage_form(&unit(), true).unwrap();
        assert!(interface.to_string().len() < full.to_string().len());
        assert_eq!(
            serializer.from_storage_form(&interface).unwrap(),
            unit().interface()
        );
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = JsonUnitSerializer
            .from_storage_form(&json!({"$format": 9, "unit": {}}))
            .unwrap_err();
        assert!(err.message().contains("format 9"));
    }

    #[test]
    fn malformed_body_is_rejected() {
        let err = JsonUnitSerializer
            .from_storage_form(&json!({"$format": 1, "unit": {"name": 5}}))
            .unwrap_err();
        assert!(err.message().starts_with("cannot read unit"));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(JsonUnitSerializer.from_storage_form(&json!([1, 2])).is_err());
    }
}
