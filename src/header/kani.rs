//! Kani harnesses for request header framing.

#![expect(clippy::big_endian_bytes, reason = "network protocol uses big-endian")]

use super::{EXTENSION_LEN, Framing, HEADER_LEN, RequestHeader, SIZE_SENTINEL};

fn any_header() -> RequestHeader {
    RequestHeader {
        command: kani::any(),
        payload_size: kani::any(),
        data_type: kani::any(),
        count: kani::any(),
        cid: kani::any(),
        available: kani::any(),
    }
}

#[kani::proof]
fn kani_framing_never_truncates() {
    let hdr = any_header();
    let extended_ok: bool = kani::any();

    match hdr.framing(extended_ok) {
        Some(Framing::Standard) => {
            kani::assert(
                hdr.payload_size < u32::from(SIZE_SENTINEL),
                "standard size fits below sentinel",
            );
            kani::assert(
                hdr.count < u32::from(SIZE_SENTINEL),
                "standard count fits below sentinel",
            );
        }
        Some(Framing::Extended) => {
            kani::assert(extended_ok, "extension only when permitted");
            kani::assert(hdr.needs_extension(), "extension only when needed");
        }
        None => {
            kani::assert(!extended_ok, "rejection only when extension forbidden");
            kani::assert(hdr.needs_extension(), "rejection only when needed");
        }
    }
}

#[kani::proof]
#[kani::unwind(32)]
fn kani_extended_header_carries_sentinels() {
    let hdr = any_header();
    let bytes = hdr.to_bytes(Framing::Extended);

    kani::assert(
        bytes.len() == HEADER_LEN + EXTENSION_LEN,
        "extended header length",
    );
    kani::assert(
        bytes.get(2..4) == Some(&SIZE_SENTINEL.to_be_bytes()[..]),
        "size field holds sentinel",
    );
    kani::assert(
        bytes.get(6..8) == Some(&SIZE_SENTINEL.to_be_bytes()[..]),
        "count field holds sentinel",
    );
    kani::assert(
        bytes.get(16..20) == Some(&hdr.payload_size.to_be_bytes()[..]),
        "extension carries payload size",
    );
}
