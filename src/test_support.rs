//! Test fixtures for unit tests.

use flate2::write::GzEncoder;
use flate2::Compression;

/// Build an in-memory gzip-compressed tarball from (path, content) pairs.
pub fn build_tar_gz(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .expect("append archive entry");
    }

    builder
        .into_inner()
        .expect("finish tar stream")
        .finish()
        .expect("finish gzip stream")
}

/// A framework-libs archive carrying the custom-config probe file.
pub fn framework_archive_with_probe() -> Vec<u8> {
    build_tar_gz(&[
        ("package.json", "{\"name\": \"framework-libs\"}\n"),
        (
            "tools/esp32-arduino-libs/sdkconfig",
            "CONFIG_FREERTOS_UNICORE=y\n",
        ),
    ])
}
