use std::io::Read;
// Import partreader types.
use partreader::Multipart;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate a reader and the boundary from somewhere e.g. server request body.
    let (reader, boundary) = get_reader_from_somewhere();

    // Create a `Multipart` instance from that reader and the boundary.
    let mut multipart = Multipart::new(reader, boundary);

    // Iterate over the parts, use `next_part()` to get the next part.
    while let Some(mut part) = multipart.next_part()? {
        // Get the part's form name and filename if provided in "Content-Disposition" header.
        println!("Name: {:?}, File Name: {:?}", part.form_name(), part.file_name());

        // Stream the content through `std::io::Read`.
        let mut content = Vec::new();
        part.read_to_end(&mut content)?;
        println!("Content: {:?}", String::from_utf8_lossy(&content));
    }

    Ok(())
}

// Generate a reader and the boundary from somewhere e.g. server request body.
fn get_reader_from_somewhere() -> (impl Read, &'static str) {
    let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

    (data.as_bytes(), "X-BOUNDARY")
}
