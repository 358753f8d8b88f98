// Mapper to convert the risk map to GeoJSON layers
use crate::domain::pipe::GeoPoint;
use crate::domain::risk_map::{HeatSegment, RiskMap, RiskMarker};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

const SEGMENT_WEIGHT: u32 = 4;
const SEGMENT_OPACITY: f64 = 0.6;
const MARKER_FILL_OPACITY: f64 = 0.7;

/// Markers first, then heat segments.
pub fn risk_map_to_geojson(map: &RiskMap) -> FeatureCollection {
    let features = map
        .markers
        .iter()
        .map(marker_to_feature)
        .chain(map.segments.iter().enumerate().map(|(i, s)| segment_to_feature(i, s)))
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

// GeoJSON positions are [lon, lat].
fn position(point: &GeoPoint) -> Vec<f64> {
    vec![point.lon, point.lat]
}

fn marker_to_feature(marker: &RiskMarker) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("layer".to_string(), JsonValue::from("marker"));
    properties.insert("qr_code".to_string(), JsonValue::from(marker.qr_code.clone()));
    properties.insert(
        "risk_score".to_string(),
        marker.risk_score.map(JsonValue::from).unwrap_or(JsonValue::Null),
    );
    properties.insert("level".to_string(), JsonValue::from(level_name(marker)));
    properties.insert("radius".to_string(), JsonValue::from(marker.radius));
    properties.insert("color".to_string(), JsonValue::from(marker.color));
    properties.insert("fill_opacity".to_string(), JsonValue::from(MARKER_FILL_OPACITY));
    properties.insert("tooltip".to_string(), JsonValue::from(marker.tooltip.clone()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(position(&marker.position)))),
        id: Some(Id::String(marker.pipe_id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn segment_to_feature(index: usize, segment: &HeatSegment) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("layer".to_string(), JsonValue::from("heat"));
    properties.insert("risk".to_string(), JsonValue::from(segment.risk));
    properties.insert("color".to_string(), JsonValue::from(segment.color));
    properties.insert("weight".to_string(), JsonValue::from(SEGMENT_WEIGHT));
    properties.insert("opacity".to_string(), JsonValue::from(SEGMENT_OPACITY));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(vec![
            position(&segment.from),
            position(&segment.to),
        ]))),
        id: Some(Id::String(format!("segment-{}", index))),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn level_name(marker: &RiskMarker) -> String {
    serde_json::to_value(marker.level)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipe::Pipe;

    #[test]
    fn test_markers_and_segments_become_features() {
        let pipes = vec![
            Pipe::new("a", "QR-a", "active").with_risk(0.9).with_location(51.1, 71.4),
            Pipe::new("b", "QR-b", "active").with_location(51.2, 71.5),
        ];
        let collection = risk_map_to_geojson(&RiskMap::project(&pipes));
        assert_eq!(collection.features.len(), 3);

        let marker = &collection.features[0];
        assert_eq!(marker.id, Some(Id::String("a".to_string())));
        let geometry = marker.geometry.as_ref().unwrap();
        assert_eq!(geometry.value, Value::Point(vec![71.4, 51.1]));
        let props = marker.properties.as_ref().unwrap();
        assert_eq!(props["level"], "critical");
        assert_eq!(props["color"], "#ff4d4f");

        let unscored = collection.features[1].properties.as_ref().unwrap();
        assert_eq!(unscored["risk_score"], JsonValue::Null);

        let segment = &collection.features[2];
        assert!(matches!(
            segment.geometry.as_ref().unwrap().value,
            Value::LineString(ref line) if line.len() == 2
        ));
        assert_eq!(segment.properties.as_ref().unwrap()["layer"], "heat");
    }

    #[test]
    fn test_empty_map_is_empty_collection() {
        let collection = risk_map_to_geojson(&RiskMap::default());
        assert!(collection.features.is_empty());
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
    }
}
