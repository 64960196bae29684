use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use sipf_object::{DownloadResult, ObjectType, SipfObject};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ObjectOutput {
    #[serde(rename = "type")]
    obj_type: String,
    type_code: u8,
    tag_id: u8,
    len: usize,
    value: String,
    wire: String,
}

impl ObjectOutput {
    fn new(object: &SipfObject) -> Self {
        Self {
            obj_type: object.obj_type().to_string(),
            type_code: object.obj_type().code(),
            tag_id: object.tag_id(),
            len: object.value_len(),
            value: value_text(object),
            wire: hex::encode_upper(object.wire_value()),
        }
    }
}

#[derive(Serialize)]
struct DownloadOutput {
    otid: String,
    user_send_millis: u64,
    received_millis: u64,
    remains: u8,
    objects: Vec<ObjectOutput>,
}

#[derive(Serialize)]
struct ExecOutput<'a> {
    command: &'a str,
    response: String,
    ok: bool,
}

pub fn print_objects(objects: &[SipfObject], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<ObjectOutput> = objects.iter().map(ObjectOutput::new).collect();
            print_json(&out);
        }
        OutputFormat::Table => println!("{}", object_table(objects)),
        OutputFormat::Pretty => {
            for object in objects {
                println!("{}", pretty_line(object));
            }
        }
        OutputFormat::Raw => {
            let mut data = Vec::new();
            for object in objects {
                data.extend_from_slice(&object.to_bytes());
            }
            print_raw(&data);
        }
    }
}

pub fn print_download(result: &DownloadResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = DownloadOutput {
                otid: result.otid.to_string(),
                user_send_millis: result.user_send_millis(),
                received_millis: result.received_millis(),
                remains: result.remains,
                objects: result.objects.iter().map(ObjectOutput::new).collect(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OTID", "SENT (ms)", "RECEIVED (ms)", "REMAINS"])
                .add_row(vec![
                    result.otid.to_string(),
                    result.user_send_millis().to_string(),
                    result.received_millis().to_string(),
                    result.remains.to_string(),
                ]);
            println!("{table}");
            if !result.is_empty() {
                println!("{}", object_table(&result.objects));
            }
        }
        OutputFormat::Pretty => {
            println!(
                "otid={} sent={} received={} remains={}",
                result.otid,
                result.user_send_millis(),
                result.received_millis(),
                result.remains
            );
            for object in &result.objects {
                println!("  {}", pretty_line(object));
            }
        }
        OutputFormat::Raw => print_objects(&result.objects, format),
    }
}

pub fn print_exec(command: &str, response: &[u8], format: OutputFormat) {
    let text = String::from_utf8_lossy(response).into_owned();
    match format {
        OutputFormat::Json => {
            let out = ExecOutput {
                command,
                ok: text.ends_with("OK\r\n"),
                response: text,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "RESPONSE"])
                .add_row(vec![command.to_string(), text.replace("\r\n", "\n")]);
            println!("{table}");
        }
        OutputFormat::Pretty => print!("{}", text.replace("\r\n", "\n")),
        OutputFormat::Raw => print_raw(response),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn object_table(objects: &[SipfObject]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["TAG", "TYPE", "LEN", "VALUE"]);
    for object in objects {
        table.add_row(vec![
            format!("{:02X}", object.tag_id()),
            object.obj_type().to_string(),
            object.value_len().to_string(),
            value_text(object),
        ]);
    }
    table
}

fn pretty_line(object: &SipfObject) -> String {
    format!(
        "tag={:02X} type={} len={} value={}",
        object.tag_id(),
        object.obj_type(),
        object.value_len(),
        value_text(object)
    )
}

/// Human-readable value. Numerics are held little-endian.
pub fn value_text(object: &SipfObject) -> String {
    let value = object.value();
    let text = match object.obj_type() {
        ObjectType::Uint8 => le(value).map(|b| u8::from_le_bytes(b).to_string()),
        ObjectType::Int8 => le(value).map(|b| i8::from_le_bytes(b).to_string()),
        ObjectType::Uint16 => le(value).map(|b| u16::from_le_bytes(b).to_string()),
        ObjectType::Int16 => le(value).map(|b| i16::from_le_bytes(b).to_string()),
        ObjectType::Uint32 => le(value).map(|b| u32::from_le_bytes(b).to_string()),
        ObjectType::Int32 => le(value).map(|b| i32::from_le_bytes(b).to_string()),
        ObjectType::Uint64 => le(value).map(|b| u64::from_le_bytes(b).to_string()),
        ObjectType::Int64 => le(value).map(|b| i64::from_le_bytes(b).to_string()),
        ObjectType::Float32 => le(value).map(|b| f32::from_le_bytes(b).to_string()),
        ObjectType::Float64 => le(value).map(|b| f64::from_le_bytes(b).to_string()),
        ObjectType::BinBase64 => Some(hex::encode_upper(value)),
        ObjectType::StrUtf8 => Some(String::from_utf8_lossy(value).into_owned()),
    };
    text.unwrap_or_else(|| hex::encode_upper(value))
}

fn le<const N: usize>(value: &[u8]) -> Option<[u8; N]> {
    value.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_render_in_host_order() {
        assert_eq!(value_text(&SipfObject::uint16(1, 0x1234)), "4660");
        assert_eq!(value_text(&SipfObject::int32(1, -2)), "-2");
        assert_eq!(value_text(&SipfObject::float32(1, 1.5)), "1.5");
    }

    #[test]
    fn strings_and_blobs_render_as_text_and_hex() {
        assert_eq!(
            value_text(&SipfObject::string(1, "hi").unwrap()),
            "hi"
        );
        assert_eq!(
            value_text(&SipfObject::binary(1, &[0xAB, 0x01]).unwrap()),
            "AB01"
        );
    }
}
