// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! Logical RPC shapes shared with peers.
//!
//! The engine does not define a wire format — an external transport
//! serializes these shapes however it likes (serde_json round-trips
//! them in the tests). `Param` is a tagged union: serde's externally
//! tagged enum encoding writes a single explicit discriminant, and
//! decoding switches on it. Payload structs that happen to share a
//! shape can never shadow each other.

pub mod queue;

pub use queue::RequestQueue;

use crate::stroke::{Color, ControlPoint, PointType, Stroke};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every operation a peer can ask the painting engine to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    SetStrokeColor,
    RemoveAllStrokes,
    RemoveStroke,
    RestoreStroke,
    AddStrokePoint,
    AddBezierStrokePoints,
    AddStrokes,
    FinishStroke,
    ChangeLineWidth,
    MoveControlPoint,
    FinishControlPoint,
}

/// Operation payloads, one variant per [`Method`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Param {
    SetStrokeColor(SetStrokeColorParam),
    RemoveAllStrokes(RemoveAllStrokesParam),
    RemoveStroke(RemoveStrokeParam),
    RestoreStroke(RestoreStrokeParam),
    AddStrokePoint(AddStrokePointParam),
    AddBezierStrokePoints(AddBezierStrokePointsParam),
    AddStrokes(AddStrokesParam),
    FinishStroke(FinishStrokeParam),
    ChangeLineWidth(ChangeLineWidthParam),
    MoveControlPoint(MoveControlPointParam),
    FinishControlPoint(FinishControlPointParam),
}

impl Param {
    /// The method this payload belongs to.
    pub fn method(&self) -> Method {
        match self {
            Param::SetStrokeColor(_) => Method::SetStrokeColor,
            Param::RemoveAllStrokes(_) => Method::RemoveAllStrokes,
            Param::RemoveStroke(_) => Method::RemoveStroke,
            Param::RestoreStroke(_) => Method::RestoreStroke,
            Param::AddStrokePoint(_) => Method::AddStrokePoint,
            Param::AddBezierStrokePoints(_) => Method::AddBezierStrokePoints,
            Param::AddStrokes(_) => Method::AddStrokes,
            Param::FinishStroke(_) => Method::FinishStroke,
            Param::ChangeLineWidth(_) => Method::ChangeLineWidth,
            Param::MoveControlPoint(_) => Method::MoveControlPoint,
            Param::FinishControlPoint(_) => Method::FinishControlPoint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetStrokeColorParam {
    pub user_id: Uuid,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveAllStrokesParam {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveStrokeParam {
    pub stroke_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreStrokeParam {
    pub stroke: StrokeData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AddStrokePointParam {
    pub stroke_id: Uuid,
    pub point: Vec3,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddBezierStrokePointsParam {
    pub stroke_id: Uuid,
    pub control_points: Vec<ControlPointData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddStrokesParam {
    pub strokes: Vec<StrokeData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishStrokeParam {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeLineWidthParam {
    pub user_id: Uuid,
    pub max_radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveControlPointParam {
    pub stroke_id: Uuid,
    pub control_point_id: Uuid,
    pub point_type: PointType,
    pub new_position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishControlPointParam {
    pub stroke_id: Uuid,
    pub control_point_id: Uuid,
}

/// One addressed request as handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSchema {
    pub id: Uuid,
    pub peer_id: i64,
    pub method: Method,
    pub param: Param,
}

impl RequestSchema {
    pub fn new(peer_id: i64, param: Param) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer_id,
            method: param.method(),
            param,
        }
    }
}

// ============================================================================
// TRANSFER OBJECTS
// ============================================================================

/// Wire/disk shape of one control point.
///
/// Handles are optional: an in-progress joint travels with whatever
/// positions it has resolved so far. Grid sub-ids are local bookkeeping
/// and never cross the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPointData {
    pub id: Uuid,
    pub stroke_id: Uuid,
    pub end: Option<Vec3>,
    pub start_control: Option<Vec3>,
    pub end_control: Option<Vec3>,
}

impl From<&ControlPoint> for ControlPointData {
    fn from(cp: &ControlPoint) -> Self {
        Self {
            id: cp.id,
            stroke_id: cp.stroke_id,
            end: cp.end(),
            start_control: cp.start_control(),
            end_control: cp.end_control(),
        }
    }
}

impl ControlPointData {
    /// Rebuild the live control point through its own state machine:
    /// a lone anchor stays anchor-only, a lone handle mirrors the
    /// opposite one (as it would during live editing), and handles
    /// without an anchor are dropped.
    pub fn into_control_point(self) -> ControlPoint {
        let mut cp = ControlPoint::with_id(self.stroke_id, self.id);
        if let Some(end) = self.end {
            cp.apply(end, PointType::End);
            match (self.start_control, self.end_control) {
                (Some(start), Some(end_control)) => {
                    cp.apply(start, PointType::StartControl);
                    // Overwrite the mirrored guess with the real one.
                    cp.apply(end_control, PointType::EndControl);
                }
                (Some(start), None) => cp.apply(start, PointType::StartControl),
                (None, Some(end_control)) => cp.apply(end_control, PointType::EndControl),
                (None, None) => {}
            }
        }
        cp
    }
}

/// Wire/disk shape of one stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeData {
    pub id: Uuid,
    pub points: Vec<Vec3>,
    pub color: Color,
    pub max_radius: f32,
    pub control_points: Vec<ControlPointData>,
}

impl From<&Stroke> for StrokeData {
    fn from(stroke: &Stroke) -> Self {
        Self {
            id: stroke.id,
            points: stroke.points.clone(),
            color: stroke.color,
            max_radius: stroke.max_radius,
            control_points: stroke
                .control_points
                .iter()
                .map(ControlPointData::from)
                .collect(),
        }
    }
}

impl StrokeData {
    /// Rebuild the live stroke, minting fresh local grid sub-ids.
    pub fn into_stroke(self) -> Stroke {
        Stroke {
            id: self.id,
            points: self.points,
            control_points: self
                .control_points
                .into_iter()
                .map(ControlPointData::into_control_point)
                .collect(),
            color: self.color,
            max_radius: self.max_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::ControlPointState;

    #[test]
    fn param_method_matches_every_variant() {
        let stroke_id = Uuid::new_v4();
        let cases = [
            (
                Param::RemoveStroke(RemoveStrokeParam { stroke_id }),
                Method::RemoveStroke,
            ),
            (
                Param::FinishStroke(FinishStrokeParam {
                    user_id: Uuid::new_v4(),
                }),
                Method::FinishStroke,
            ),
            (
                Param::RemoveAllStrokes(RemoveAllStrokesParam {}),
                Method::RemoveAllStrokes,
            ),
        ];
        for (param, method) in cases {
            assert_eq!(param.method(), method);
        }
    }

    #[test]
    fn params_decode_by_explicit_tag() {
        // MoveControlPoint and FinishControlPoint share a stroke_id /
        // control_point_id prefix; the tag keeps them apart.
        let param = Param::FinishControlPoint(FinishControlPointParam {
            stroke_id: Uuid::new_v4(),
            control_point_id: Uuid::new_v4(),
        });
        let json = serde_json::to_string(&param).unwrap();
        assert!(json.contains("FinishControlPoint"));

        let decoded: Param = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, param);
        assert_eq!(decoded.method(), Method::FinishControlPoint);
    }

    #[test]
    fn request_schema_round_trips_through_json() {
        let request = RequestSchema::new(
            42,
            Param::AddStrokePoint(AddStrokePointParam {
                stroke_id: Uuid::new_v4(),
                point: Vec3::new(0.1, 0.2, 0.3),
                user_id: Uuid::new_v4(),
            }),
        );
        let json = serde_json::to_string(&request).unwrap();
        let decoded: RequestSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.method, Method::AddStrokePoint);
    }

    #[test]
    fn stroke_data_round_trips_a_finished_stroke() {
        let mut stroke = Stroke::new(Uuid::new_v4());
        stroke.points = vec![Vec3::ZERO, Vec3::ONE];
        stroke.color = Color::RED;
        stroke.max_radius = 0.02;

        let mut cp = ControlPoint::new(stroke.id);
        cp.apply(Vec3::ZERO, PointType::End);
        cp.apply(Vec3::new(0.5, 0.0, 0.0), PointType::EndControl);
        stroke.control_points = vec![cp];

        let data = StrokeData::from(&stroke);
        let rebuilt = data.clone().into_stroke();

        assert_eq!(rebuilt.id, stroke.id);
        assert_eq!(rebuilt.points, stroke.points);
        assert_eq!(rebuilt.color, stroke.color);
        assert_eq!(rebuilt.control_points.len(), 1);
        let original = &stroke.control_points[0];
        let restored = &rebuilt.control_points[0];
        assert_eq!(restored.id, original.id);
        assert_eq!(restored.end(), original.end());
        assert_eq!(restored.start_control(), original.start_control());
        assert_eq!(restored.end_control(), original.end_control());
        // Grid sub-ids are minted locally, not carried.
        assert_ne!(restored.anchor_grid_id, original.anchor_grid_id);
    }

    #[test]
    fn partial_control_point_decodes_conservatively() {
        let data = ControlPointData {
            id: Uuid::new_v4(),
            stroke_id: Uuid::new_v4(),
            end: Some(Vec3::ONE),
            start_control: None,
            end_control: None,
        };
        let cp = data.into_control_point();
        assert_eq!(cp.end(), Some(Vec3::ONE));
        assert!(!cp.is_complete());

        let headless = ControlPointData {
            end: None,
            start_control: Some(Vec3::ONE),
            ..data
        };
        let cp = headless.into_control_point();
        assert_eq!(cp.state(), ControlPointState::Empty);
    }
}
