// cargo run --example multipart_file --features tracing

use std::env::temp_dir;

use missive::message::{header::ContentType, Attachment, Message, MultiPartKind, Part};
use missive::{FileTransport, Transport};

fn main() {
    tracing_subscriber::fmt::init();

    let mut email = Message::builder()
        .from("NoBody <nobody@domain.tld>")
        .reply_to("Yuin <yuin@domain.tld>")
        .to("Hei <hei@domain.tld>")
        .bcc("Archive <archive@domain.tld>")
        .subject("Happy new year, Ðearest")
        .multipart(MultiPartKind::Alternative)
        .part(Part::text_plain("Be happy!".into()))
        .part(Part::text_html("<p><b>Be</b> happy! <img src=\"cid:logo\"></p>".into()))
        .attachment(
            Attachment::new("logo.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>")
                .content_type("image/svg+xml".parse::<ContentType>().unwrap())
                .inline()
                .content_id("logo"),
        )
        .build()
        .unwrap();

    let transport = FileTransport::new(temp_dir());
    let id = transport.send(&mut email).unwrap();

    println!(
        "{} written to {}",
        email.message_id().unwrap_or_default(),
        temp_dir().join(format!("{}.eml", id)).display()
    );
}
