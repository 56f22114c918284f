#![no_main]

use libfuzzer_sys::fuzz_target;
use partreader::{Constraints, Multipart, SizeLimit};
use std::io::{self, Read};

fuzz_target!(|data: &[u8]| {
    let constraints = Constraints::new().size_limit(SizeLimit::new().line(4096));
    let mut multipart = Multipart::with_constraints(data, "X-BOUNDARY", constraints);

    let mut breaks = 0;
    while breaks < 3 {
        match multipart.next_part() {
            Err(_) | Ok(None) => breaks += 1,
            Ok(Some(mut part)) => {
                if part.index() % 2 == 0 {
                    let _ = io::copy(&mut part, &mut io::sink());
                } else {
                    let _ = part.read(&mut [0u8; 7]);
                }
            }
        }
    }
});
