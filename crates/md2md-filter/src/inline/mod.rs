//! Inline link and image rewriting.
//!
//! Buffered text is tokenized once, then each token is resolved against the
//! session: inline images may be imported, copied, checked or embedded;
//! reference-style images may be embedded or pointed at exported files; raw
//! `<img>` tags are only checked.

mod tokenizer;

use std::borrow::Cow;

use crate::error::FilterError;
use crate::html::{img_tag, tag_attribute};
use crate::link::{quote_pad_title, ref_key};
use crate::options::ImageMode;
use crate::session::Session;

use self::tokenizer::{InlineLink, RefLink, Token, tokenize};

/// Rewrite links and images in a chunk of buffered text.
pub(crate) fn resolve(session: &mut Session<'_>, chunk: &str) -> Result<String, FilterError> {
    let mut out = String::with_capacity(chunk.len());
    for token in tokenize(chunk) {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Link(link) => out.push_str(&resolve_inline(session, &link)?),
            Token::Reference(reference) => out.push_str(&resolve_reference(session, &reference)),
            Token::ImgTag(tag) => {
                check_img_tag(session, tag);
                out.push_str(tag);
            }
        }
    }
    Ok(out)
}

fn resolve_inline<'a>(
    session: &mut Session<'_>,
    link: &InlineLink<'a>,
) -> Result<Cow<'a, str>, FilterError> {
    if !link.image {
        return Ok(Cow::Borrowed(link.raw));
    }
    let images = session.options.images;

    if session.is_importable(link.target) {
        match images.mode {
            Some(ImageMode::Import) => {
                if let Some(key) = session.import_image(link.target, link.title) {
                    if images.embed
                        && let Some(target) = session.refs.imported(&key)
                    {
                        return Ok(Cow::Owned(img_tag(&target.link, link.text, &target.title)));
                    }
                    return Ok(Cow::Owned(format!("![{}][{key}]", link.text)));
                }
            }
            Some(ImageMode::Check) => {
                session.check_image(link.target);
            }
            Some(ImageMode::Copy) => {
                if let Some(new_link) = session.copy_image(link.target)? {
                    return Ok(Cow::Owned(if images.embed {
                        img_tag(&new_link, link.text, link.title)
                    } else {
                        format!(
                            "![{}]({new_link}{})",
                            link.text,
                            quote_pad_title(link.title, false)
                        )
                    }));
                }
            }
            Some(ImageMode::Export) | None => {}
        }
    }

    if images.embed {
        return Ok(Cow::Owned(img_tag(link.target, link.text, link.title)));
    }
    Ok(Cow::Borrowed(link.raw))
}

fn resolve_reference<'a>(session: &mut Session<'_>, reference: &RefLink<'a>) -> Cow<'a, str> {
    if !reference.image {
        return Cow::Borrowed(reference.raw);
    }
    let label = reference
        .label
        .filter(|label| !label.is_empty())
        .unwrap_or(reference.text);
    let key = ref_key(label);
    session.refs.use_image(&key, reference.text);

    let images = session.options.images;
    if images.embed
        && let Some(target) = session.refs.resolve(&key)
    {
        return Cow::Owned(img_tag(&target.link, reference.text, &target.title));
    }
    if images.is(ImageMode::Export)
        && let Some(target) = session.refs.rewritten(&key)
    {
        return Cow::Owned(format!(
            "![{}]({}{})",
            reference.text,
            target.link,
            quote_pad_title(&target.title, true)
        ));
    }
    Cow::Borrowed(reference.raw)
}

fn check_img_tag(session: &mut Session<'_>, tag: &str) {
    if !session.options.images.is(ImageMode::Check) {
        return;
    }
    if let Some(src) = tag_attribute("src", tag) {
        session.check_image(&src);
    }
}
