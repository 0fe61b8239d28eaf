//! Minimal mix-model artifacts for tests
//!
//! Writes a real ONNX graph with the four mix-model inputs. The output is
//! `base + mean(tracks)`, shaped `[1, base.len()]`, so callers control both
//! the output length and, through the stem contents, its values.

use std::path::Path;

use tract_onnx::pb::{
    AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    TypeProto, ValueInfoProto, attribute_proto::AttributeType, tensor_proto::DataType,
    type_proto,
};

use crate::inference::slots;

fn value_info(name: &str, elem_type: DataType) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: elem_type as i32,
                shape: None,
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn node(op_type: &str, inputs: &[&str], output: &str, attribute: Vec<AttributeProto>) -> NodeProto {
    NodeProto {
        input: inputs.iter().map(|s| s.to_string()).collect(),
        output: vec![output.to_string()],
        name: output.to_string(),
        op_type: op_type.to_string(),
        attribute,
        ..Default::default()
    }
}

/// Encoded model whose single output is `base + mean(tracks)`
pub fn mix_model_bytes(base: &[f32]) -> Vec<u8> {
    let reduce = node(
        "ReduceMean",
        &[slots::TRACKS],
        "mean",
        vec![
            AttributeProto {
                name: "axes".into(),
                r#type: AttributeType::Ints as i32,
                ints: vec![1, 2, 3],
                ..Default::default()
            },
            AttributeProto {
                name: "keepdims".into(),
                r#type: AttributeType::Int as i32,
                i: 0,
                ..Default::default()
            },
        ],
    );
    let add = node("Add", &["base", "mean"], "mix", Vec::new());

    let graph = GraphProto {
        name: "mix".into(),
        node: vec![reduce, add],
        initializer: vec![TensorProto {
            name: "base".into(),
            dims: vec![1, base.len() as i64],
            data_type: DataType::Float as i32,
            float_data: base.to_vec(),
            ..Default::default()
        }],
        input: vec![
            value_info(slots::GENRE, DataType::Int64),
            value_info(slots::TRACKS, DataType::Float),
            value_info(slots::INSTRUMENTS, DataType::Int64),
            value_info(slots::VALID_MASK, DataType::Bool),
        ],
        output: vec![value_info("mix", DataType::Float)],
        ..Default::default()
    };

    let model = ModelProto {
        ir_version: 8,
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
        producer_name: "automix-fixtures".into(),
        graph: Some(graph),
        ..Default::default()
    };

    prost::Message::encode_to_vec(&model)
}

/// Write [`mix_model_bytes`] to `path`
pub fn write_mix_model(path: &Path, base: &[f32]) -> std::io::Result<()> {
    std::fs::write(path, mix_model_bytes(base))
}
