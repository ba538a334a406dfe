//! Utility to create fuzzing corpus data for request decoders.
//!
//! Frames a set of representative requests through the send queue and writes
//! each drained byte stream into the `fuzz/corpus` directory. Pool sizing is
//! read from the usual configuration layers.
use std::{fs, path::Path};

use anyhow::Context;
use ca_sendq::{
    BufferPool,
    FreeListPool,
    QueueConfig,
    RequestWriter,
    SendQueue,
    dbr::{DBR_DOUBLE, DBR_LONG, DBR_STRING, DbrString, Payload},
    request_code::CA_MINOR_PROTOCOL_REVISION,
};
use ortho_config::OrthoConfig;

const CORPUS_DIR: &str = "fuzz/corpus";

type Build = fn(&mut RequestWriter<'_, &FreeListPool>) -> anyhow::Result<()>;

fn handshake(w: &mut RequestWriter<'_, &FreeListPool>) -> anyhow::Result<()> {
    w.version(0, CA_MINOR_PROTOCOL_REVISION)?;
    w.host_name(c"corpus-host")?;
    w.client_name(c"fuzzer")?;
    w.create_channel(c"TEST:AI", 1, CA_MINOR_PROTOCOL_REVISION)?;
    Ok(())
}

fn write_long_array(w: &mut RequestWriter<'_, &FreeListPool>) -> anyhow::Result<()> {
    let values: Vec<i32> = (0..64).collect();
    w.write(7, 1, DBR_LONG, 64, Payload::from(&values[..]))?;
    Ok(())
}

fn write_notify_string(w: &mut RequestWriter<'_, &FreeListPool>) -> anyhow::Result<()> {
    let value = [DbrString::new("corpus").context("build string")?];
    w.write_notify(7, 2, DBR_STRING, 1, Payload::from(&value[..]))?;
    Ok(())
}

fn subscribe(w: &mut RequestWriter<'_, &FreeListPool>) -> anyhow::Result<()> {
    w.read_notify(7, 3, DBR_DOUBLE, 1)?;
    w.event_add(7, 4, DBR_DOUBLE, 1, 0x0005)?;
    w.event_cancel(7, 4, DBR_DOUBLE, 1)?;
    w.clear_channel(7, 1)?;
    Ok(())
}

fn extended_write(w: &mut RequestWriter<'_, &FreeListPool>) -> anyhow::Result<()> {
    let values = vec![1.5_f64; 10_000];
    w.write(7, 1, DBR_DOUBLE, 10_000, Payload::from(&values[..]))?;
    Ok(())
}

fn save(pool: &FreeListPool, path: &Path, build: Build) -> anyhow::Result<()> {
    let mut queue = SendQueue::new(pool);
    build(&mut RequestWriter::new(&mut queue, CA_MINOR_PROTOCOL_REVISION))?;
    let mut bytes = Vec::with_capacity(queue.occupied_bytes());
    while let Some(buf) = queue.pop_next_com_buf_to_send() {
        bytes.extend_from_slice(buf.as_bytes());
        queue.pool().release(buf);
    }
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let config = QueueConfig::load_from_iter(std::env::args_os()).context("load configuration")?;
    let pool = FreeListPool::from_config(&config);
    let dir = Path::new(CORPUS_DIR);
    fs::create_dir_all(dir).context("create corpus directory")?;

    let cases: [(&str, Build); 5] = [
        ("handshake.bin", handshake),
        ("write_long_array.bin", write_long_array),
        ("write_notify_string.bin", write_notify_string),
        ("subscribe.bin", subscribe),
        ("extended_write.bin", extended_write),
    ];
    for (name, build) in cases {
        save(&pool, &dir.join(name), build)?;
    }
    Ok(())
}
