//! Consuming data in wire format.
//!
//! The transport never decodes messages. It does, however, need to peek
//! into them in a few places: the question type tells whether a query asks
//! for a zone transfer and the record types of the answer section tell
//! where a zone transfer ends. The functions in this module walk a message
//! just far enough for that, skipping over everything else.

use super::header::Header;
use super::iana::Rtype;
use core::fmt;
use octseq::parse::{Parser, ShortInput};

//------------ skip functions ------------------------------------------------

/// Skips over an encoded domain name.
///
/// A compression pointer ends the name. The pointer target is not followed
/// since only the length of the name within the message is of interest.
pub fn skip_name(parser: &mut Parser<'_, [u8]>) -> Result<(), ParseError> {
    let mut len = 0usize;
    loop {
        let ltype = parser.parse_u8()?;
        match ltype {
            0 => return Ok(()),
            1..=0x3F => {
                len += usize::from(ltype) + 1;
                if len > 255 {
                    return Err(ParseError::form_error("long domain name"));
                }
                parser.advance(ltype.into())?;
            }
            0xC0..=0xFF => {
                parser.advance(1)?;
                return Ok(());
            }
            _ => return Err(ParseError::form_error("invalid label type")),
        }
    }
}

/// Skips over a question: the name, type, and class.
fn skip_question(parser: &mut Parser<'_, [u8]>) -> Result<Rtype, ParseError> {
    skip_name(parser)?;
    let qtype = parser.parse_u16_be()?;
    parser.advance(2)?;
    Ok(qtype.into())
}

//------------ Message inspection --------------------------------------------

/// Returns the type of the first question of a message.
///
/// Returns `Ok(None)` if the message has an empty question section.
pub fn first_qtype(message: &[u8]) -> Result<Option<Rtype>, ParseError> {
    let header = Header::for_message_slice(message)?;
    if header.qdcount() == 0 {
        return Ok(None);
    }
    let mut parser = Parser::from_ref(message);
    parser.advance(Header::LEN)?;
    skip_question(&mut parser).map(Some)
}

/// Returns whether the message is a request for a full zone transfer.
///
/// Messages that cannot be walked are not zone transfer requests.
pub fn is_axfr_request(message: &[u8]) -> bool {
    matches!(first_qtype(message), Ok(Some(Rtype::AXFR)))
}

/// Returns an iterator over the record types of the answer section.
///
/// The question section is skipped when creating the iterator, so a
/// malformed question section is reported right away.
pub fn answer_types(
    message: &[u8],
) -> Result<AnswerTypes<'_>, ParseError> {
    let header = Header::for_message_slice(message)?;
    let mut parser = Parser::from_ref(message);
    parser.advance(Header::LEN)?;
    for _ in 0..header.qdcount() {
        skip_question(&mut parser)?;
    }
    Ok(AnswerTypes {
        parser,
        remaining: header.ancount(),
    })
}

//------------ AnswerTypes ---------------------------------------------------

/// An iterator over the record types in the answer section of a message.
///
/// Once an error was returned, the iterator is exhausted.
pub struct AnswerTypes<'a> {
    /// The parser positioned at the next record.
    parser: Parser<'a, [u8]>,

    /// The number of records left in the section.
    remaining: u16,
}

impl<'a> AnswerTypes<'a> {
    fn next_type(&mut self) -> Result<Rtype, ParseError> {
        skip_name(&mut self.parser)?;
        let rtype = self.parser.parse_u16_be()?;
        // Class and TTL.
        self.parser.advance(6)?;
        let rdlen = self.parser.parse_u16_be()?;
        self.parser.advance(rdlen.into())?;
        Ok(rtype.into())
    }
}

impl<'a> Iterator for AnswerTypes<'a> {
    type Item = Result<Rtype, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let res = self.next_type();
        if res.is_err() {
            self.remaining = 0;
        }
        Some(res)
    }
}

//------------ ParseError ----------------------------------------------------

/// An error happened while parsing data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An attempt was made to go beyond the end of the parser.
    ShortInput,

    /// A formatting error occurred.
    Form(FormError),
}

impl ParseError {
    /// Creates a new parse error as a form error with the given message.
    pub fn form_error(msg: &'static str) -> Self {
        FormError::new(msg).into()
    }
}

//--- From

impl From<ShortInput> for ParseError {
    fn from(_: ShortInput) -> Self {
        ParseError::ShortInput
    }
}

impl From<FormError> for ParseError {
    fn from(err: FormError) -> Self {
        ParseError::Form(err)
    }
}

//--- Display and Error

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::ShortInput => f.write_str("unexpected end of input"),
            ParseError::Form(ref err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ParseError {}

//------------ FormError -----------------------------------------------------

/// A formatting error occured.
///
/// This is a generic error for all kinds of error cases that result in data
/// not being accepted. For diagnostics, the error is being given a static
/// string describing the error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormError(&'static str);

impl FormError {
    /// Creates a new form error value with the given diagnostics string.
    pub fn new(msg: &'static str) -> Self {
        FormError(msg)
    }
}

//--- Display and Error

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for FormError {}

//============ Testing =======================================================
