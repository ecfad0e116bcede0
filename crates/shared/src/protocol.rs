use serde::{Deserialize, Serialize};

/// Body of a successful `POST /analyze_booking/{session_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerAck {
    pub message: String,
}

/// One player-position sample against the reference frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub x: f64,
    pub y: f64,
    pub conf: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

/// Body of a successful `GET /analysis_results/{session_id}`. The service
/// may attach extra bookkeeping fields (e.g. a `status` string); they are
/// ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_shots: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmap_data: Option<Vec<PositionSample>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_dimensions: Option<VideoDimensions>,
}

/// Body the service sends alongside any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_results_payload() {
        let raw = r#"{
            "total_shots": 5,
            "heatmap_data": [{"x": 120.0, "y": 340.5, "conf": 0.92}],
            "video_dimensions": {"width": 640, "height": 360},
            "status": "completed"
        }"#;

        let result: AnalysisResult = serde_json::from_str(raw).expect("decode");
        assert_eq!(result.total_shots, 5);
        assert_eq!(result.heatmap_data.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            result.video_dimensions,
            Some(VideoDimensions {
                width: 640,
                height: 360
            })
        );
    }

    #[test]
    fn decodes_results_without_heatmap() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"total_shots": 0}"#).expect("decode");
        assert_eq!(result.total_shots, 0);
        assert!(result.heatmap_data.is_none());
        assert!(result.video_dimensions.is_none());
    }
}
