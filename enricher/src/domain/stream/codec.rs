//! Length-delimited OTLP metric stream codec
//!
//! Each message is prefixed with its size as a base-128 varint of at most
//! five bytes. A record ending in the middle of a prefix or body is treated
//! as exhausted; only malformed data before that point is an error.

use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use prost::Message;
use thiserror::Error;

/// Longest varint accepted for a message size (32-bit length)
const MAX_LENGTH_BYTES: usize = 5;

/// Errors decoding a metric stream record
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid message length prefix at offset {offset}")]
    InvalidLength { offset: usize },

    #[error("Failed to decode metrics request at offset {offset}: {source}")]
    Decode {
        offset: usize,
        #[source]
        source: prost::DecodeError,
    },
}

enum Prefix {
    Length { value: usize, width: usize },
    Truncated,
}

/// Read a length prefix starting at `buf[0]`
fn read_length(buf: &[u8], offset: usize) -> Result<Prefix, CodecError> {
    let mut value: u64 = 0;
    for (i, &byte) in buf.iter().take(MAX_LENGTH_BYTES).enumerate() {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            let value = u32::try_from(value).map_err(|_| CodecError::InvalidLength { offset })?;
            return Ok(Prefix::Length {
                value: value as usize,
                width: i + 1,
            });
        }
    }
    if buf.len() < MAX_LENGTH_BYTES {
        Ok(Prefix::Truncated)
    } else {
        Err(CodecError::InvalidLength { offset })
    }
}

/// Decode every complete message of a record, in order
pub fn decode_requests(data: &[u8]) -> Result<Vec<ExportMetricsServiceRequest>, CodecError> {
    let mut requests = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let (len, width) = match read_length(&data[offset..], offset)? {
            Prefix::Length { value, width } => (value, width),
            Prefix::Truncated => {
                tracing::debug!(offset, "Record ends inside a length prefix");
                break;
            }
        };

        let start = offset + width;
        let Some(body) = data.get(start..start + len) else {
            tracing::debug!(offset, len, "Record ends inside a message body");
            break;
        };

        let request = ExportMetricsServiceRequest::decode(body)
            .map_err(|source| CodecError::Decode { offset, source })?;
        requests.push(request);
        offset = start + len;
    }

    Ok(requests)
}

/// Encode messages with the same framing `decode_requests` reads
pub fn encode_requests(requests: &[ExportMetricsServiceRequest]) -> Vec<u8> {
    let capacity = requests
        .iter()
        .map(|r| r.encoded_len() + MAX_LENGTH_BYTES)
        .sum();
    let mut buf = Vec::with_capacity(capacity);
    for request in requests {
        buf.extend_from_slice(&request.encode_length_delimited_to_vec());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::otlp::string_attr;
    use opentelemetry_proto::tonic::metrics::v1::{
        Metric, ResourceMetrics, ScopeMetrics, Summary, SummaryDataPoint, metric,
    };
    use opentelemetry_proto::tonic::resource::v1::Resource;

    fn request(metric_name: &str) -> ExportMetricsServiceRequest {
        ExportMetricsServiceRequest {
            resource_metrics: vec![ResourceMetrics {
                resource: Some(Resource {
                    attributes: vec![string_attr("cloud.region", "us-east-1")],
                    ..Default::default()
                }),
                scope_metrics: vec![ScopeMetrics {
                    metrics: vec![Metric {
                        name: metric_name.to_string(),
                        data: Some(metric::Data::Summary(Summary {
                            data_points: vec![SummaryDataPoint {
                                attributes: vec![string_attr("Namespace", "AWS/EC2")],
                                count: 10,
                                sum: 50.0,
                                ..Default::default()
                            }],
                        })),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_round_trip() {
        let batch = vec![request("a"), request("b"), request("c")];
        let encoded = encode_requests(&batch);
        assert_eq!(decode_requests(&encoded).unwrap(), batch);
    }

    #[test]
    fn test_reencode_is_byte_identical() {
        let encoded = encode_requests(&[request("a"), request("b")]);
        let decoded = decode_requests(&encoded).unwrap();
        assert_eq!(encode_requests(&decoded), encoded);
    }

    #[test]
    fn test_prefix_is_body_length() {
        let req = request("a");
        let encoded = encode_requests(std::slice::from_ref(&req));
        assert_eq!(encoded[0] as usize, req.encoded_len());
        assert_eq!(encoded.len(), req.encoded_len() + 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(decode_requests(&[]).unwrap().is_empty());
        assert!(encode_requests(&[]).is_empty());
    }

    #[test]
    fn test_truncated_body_stops() {
        let mut encoded = encode_requests(&[request("a")]);
        let second = encode_requests(&[request("b")]);
        encoded.extend_from_slice(&second[..second.len() - 3]);

        let decoded = decode_requests(&encoded).unwrap();
        assert_eq!(decoded, vec![request("a")]);
    }

    #[test]
    fn test_truncated_prefix_stops() {
        let mut encoded = encode_requests(&[request("a")]);
        // First byte of a multi-byte varint with the continuation bit set
        encoded.push(0x80);

        let decoded = decode_requests(&encoded).unwrap();
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn test_unterminated_varint_is_error() {
        let mut encoded = encode_requests(&[request("a")]);
        let offset = encoded.len();
        encoded.extend_from_slice(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);

        let result = decode_requests(&encoded);
        assert!(matches!(result, Err(CodecError::InvalidLength { offset: o }) if o == offset));
    }

    #[test]
    fn test_length_over_32_bits_is_error() {
        // 5-byte varint encoding 2^34
        let result = decode_requests(&[0x80, 0x80, 0x80, 0x80, 0x40]);
        assert!(matches!(result, Err(CodecError::InvalidLength { offset: 0 })));
    }

    #[test]
    fn test_garbage_body_is_error() {
        // Field 1 declared as length-delimited with a length past the body end
        let data = [0x03, 0x0a, 0x7f, 0x00];
        let result = decode_requests(&data);
        assert!(matches!(result, Err(CodecError::Decode { offset: 0, .. })));
    }

    #[test]
    fn test_empty_message_decodes() {
        let decoded = decode_requests(&[0x00]).unwrap();
        assert_eq!(decoded, vec![ExportMetricsServiceRequest::default()]);
    }
}
