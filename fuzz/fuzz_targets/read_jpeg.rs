#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = exif_evidence::Reader::new().read_jpeg(data);
    // Reach the HDR+ stages directly, as a JPEG seldom gets that far.
    let _ = exif_evidence::hdrplus::inflate(&exif_evidence::hdrplus::decrypt(data));
    let _ = exif_evidence::xmp::XmpDocument::parse(&String::from_utf8_lossy(data));
});
