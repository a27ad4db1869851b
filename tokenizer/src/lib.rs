//! Tokenizer for HTML fragments.
//!
//! Follows the shape of the tokenization stage of the HTML standard
//! (https://html.spec.whatwg.org/multipage/parsing.html#tokenization), limited
//! to what fragment markup needs: tags and attributes, text, comments, doctypes,
//! character references and the RCDATA / RAWTEXT content models. The tree
//! builder is responsible for switching into [`State::RawText`] or
//! [`State::RcData`] after it sees the matching start tag.

use std::collections::VecDeque;

use named_character_references::longest_named_character_reference;

mod named_character_references;

macro_rules! on {
    ($c:expr) => {
        Some($c)
    };
}

macro_rules! on_whitespace {
    () => {
        on!('\t') | // Tab
        on!('\n') | // Line Feed
        on!('\u{000c}') | // Form Feed
        on!(' ') // Space
    };
}

macro_rules! on_anything_else {
    () => {
        Some(_)
    };
    ($c:ident) => {
        Some($c)
    };
}

macro_rules! on_eof {
    () => {
        None
    };
}

macro_rules! on_ascii_digit {
    () => {
        Some('0'..='9')
    };
    ($c:ident) => {
        Some($c @ '0'..='9')
    };
}

macro_rules! on_ascii_upper_alpha {
    () => {
        Some('A'..='Z')
    };
    ($c:ident) => {
        Some($c @ 'A'..='Z')
    };
}

macro_rules! on_ascii_lower_alpha {
    () => {
        Some('a'..='z')
    };
    ($c:ident) => {
        Some($c @ 'a'..='z')
    };
}

macro_rules! on_ascii_alpha {
    () => {
        on_ascii_upper_alpha!() | on_ascii_lower_alpha!()
    };
}

macro_rules! on_ascii_alphanumeric {
    () => {
        on_ascii_digit!() | on_ascii_alpha!()
    };
}

macro_rules! on_ascii_hex_digit {
    () => {
        on_ascii_digit!() | Some('a'..='f') | Some('A'..='F')
    };
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Data,
    RcData,
    RawText,
    TagOpen,
    EndTagOpen,
    TagName,
    RcDataLessThanSign,
    RcDataEndTagOpen,
    RcDataEndTagName,
    RawTextLessThanSign,
    RawTextEndTagOpen,
    RawTextEndTagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    AfterAttributeValueQuoted,
    SelfClosingStartTag,
    BogusComment,
    MarkupDeclarationOpen,
    CommentStart,
    CommentStartDash,
    Comment,
    CommentEndDash,
    CommentEnd,
    Doctype,
    CharacterReference,
    NamedCharacterReference,
    NumericCharacterReference,
    HexadecimalCharacterReferenceStart,
    DecimalCharacterReferenceStart,
    HexadecimalCharacterReference,
    DecimalCharacterReference,
    NumericCharacterReferenceEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Doctype {
        name: String,
    },
    StartTag {
        name: String,
        self_closing: bool,
        attributes: Vec<Attribute>,
    },
    EndTag {
        name: String,
    },
    Comment {
        data: String,
    },
    Character {
        data: char,
    },
    EndOfFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    fn empty() -> Self {
        Self {
            name: String::new(),
            value: String::new(),
        }
    }
}

#[derive(Debug)]
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    state: State,
    return_state: Option<State>,
    reconsume: bool,
    temporary_buffer: String,
    queue: VecDeque<Token>,
    current_input_character: Option<char>,
    current_token: Option<Token>,
    current_attribute: Option<Attribute>,
    last_start_tag_name: Option<String>,
    character_reference_code: u32,
    eof_emitted: bool,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            state: State::Data,
            return_state: None,
            reconsume: false,
            temporary_buffer: String::new(),
            queue: VecDeque::new(),
            current_input_character: None,
            current_token: None,
            current_attribute: None,
            last_start_tag_name: None,
            character_reference_code: 0,
            eof_emitted: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn switch_to(&mut self, state: State) {
        self.state = state;
    }

    /// Returns the next token, or `None` once [`Token::EndOfFile`] has been handed out.
    pub fn next_token(&mut self) -> Option<Token> {
        while self.queue.is_empty() {
            if self.eof_emitted {
                return None;
            }
            self.step();
        }
        self.queue.pop_front()
    }

    /// Tokenizes the whole input in the data state, ignoring content models.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn consume_next_input_character(&mut self) {
        if self.reconsume {
            self.reconsume = false;
            return;
        }
        self.current_input_character = self.input.get(self.position).copied();
        if self.current_input_character.is_some() {
            self.position += 1;
        }
    }

    fn next_characters_are(&self, chars: &str, case_insensitive: bool) -> bool {
        let mut position = self.position;
        for expected in chars.chars() {
            match self.input.get(position) {
                Some(actual) if case_insensitive && actual.eq_ignore_ascii_case(&expected) => {}
                Some(actual) if *actual == expected => {}
                _ => return false,
            }
            position += 1;
        }
        true
    }

    fn consume_characters(&mut self, characters: &str) {
        self.position += characters.chars().count();
    }

    fn reconsume_in(&mut self, state: State) {
        self.reconsume = true;
        self.switch_to(state);
    }

    fn switch_to_return_state(&mut self) {
        self.state = self.return_state.take().unwrap_or(State::Data);
    }

    fn reconsume_in_return_state(&mut self) {
        self.reconsume = true;
        self.switch_to_return_state();
    }

    fn emit_token(&mut self, token: Token) {
        if token == Token::EndOfFile {
            self.eof_emitted = true;
        }
        self.queue.push_back(token);
    }

    fn emit_character(&mut self, data: char) {
        self.emit_token(Token::Character { data });
    }

    fn emit_end_of_file(&mut self) {
        self.emit_token(Token::EndOfFile);
    }

    fn push_current_attribute_to_current_tag(&mut self) {
        if let Some(attribute) = self.current_attribute.take() {
            if let Some(Token::StartTag { attributes, .. }) = &mut self.current_token {
                // Duplicate attributes are dropped, the first one wins.
                if !attributes.iter().any(|a| a.name == attribute.name) {
                    attributes.push(attribute);
                }
            }
        }
    }

    fn start_new_attribute(&mut self, attribute: Attribute) {
        self.push_current_attribute_to_current_tag();
        self.current_attribute = Some(attribute);
    }

    fn emit_current_token(&mut self) {
        self.push_current_attribute_to_current_tag();

        if let Some(token) = self.current_token.take() {
            if let Token::StartTag { name, .. } = &token {
                self.last_start_tag_name = Some(name.clone());
            }
            self.emit_token(token);
        }
    }

    fn append_to_tag_name(&mut self, character: char) {
        match &mut self.current_token {
            Some(Token::StartTag { name, .. }) | Some(Token::EndTag { name }) => {
                name.push(character)
            }
            _ => {}
        }
    }

    fn append_to_attribute_name(&mut self, character: char) {
        if let Some(attribute) = &mut self.current_attribute {
            attribute.name.push(character);
        }
    }

    fn append_to_attribute_value(&mut self, character: char) {
        if let Some(attribute) = &mut self.current_attribute {
            attribute.value.push(character);
        }
    }

    fn append_to_comment(&mut self, data: &str) {
        if let Some(Token::Comment { data: comment }) = &mut self.current_token {
            comment.push_str(data);
        }
    }

    fn append_to_doctype_name(&mut self, character: char) {
        if let Some(Token::Doctype { name }) = &mut self.current_token {
            name.push(character);
        }
    }

    fn set_self_closing_flag(&mut self) {
        if let Some(Token::StartTag { self_closing, .. }) = &mut self.current_token {
            *self_closing = true;
        }
    }

    fn is_appropriate_end_tag_token(&self) -> bool {
        match (&self.current_token, &self.last_start_tag_name) {
            (Some(Token::EndTag { name }), Some(last)) => name == last,
            _ => false,
        }
    }

    fn consumed_as_part_of_an_attribute(&self) -> bool {
        matches!(
            self.return_state,
            Some(State::AttributeValueDoubleQuoted)
                | Some(State::AttributeValueSingleQuoted)
                | Some(State::AttributeValueUnquoted)
        )
    }

    fn flush_code_points_consumed_as_a_character_reference(&mut self) {
        let buffer = std::mem::take(&mut self.temporary_buffer);
        if self.consumed_as_part_of_an_attribute() {
            if let Some(attribute) = &mut self.current_attribute {
                attribute.value.push_str(&buffer);
            }
        } else {
            for character in buffer.chars() {
                self.emit_character(character);
            }
        }
    }

    // Shared by the RCDATA and RAWTEXT less-than-sign states.
    fn text_less_than_sign(&mut self, text_state: State, end_tag_open_state: State) {
        self.consume_next_input_character();
        match self.current_input_character {
            on!('/') => {
                self.temporary_buffer.clear();
                self.switch_to(end_tag_open_state);
            }
            _ => {
                self.emit_character('<');
                self.reconsume_in(text_state);
            }
        }
    }

    // Shared by the RCDATA and RAWTEXT end tag open states.
    fn text_end_tag_open(&mut self, text_state: State, end_tag_name_state: State) {
        self.consume_next_input_character();
        match self.current_input_character {
            on_ascii_alpha!() => {
                self.current_token = Some(Token::EndTag {
                    name: String::new(),
                });
                self.reconsume_in(end_tag_name_state);
            }
            _ => {
                self.emit_character('<');
                self.emit_character('/');
                self.reconsume_in(text_state);
            }
        }
    }

    // Shared by the RCDATA and RAWTEXT end tag name states.
    fn text_end_tag_name(&mut self, text_state: State) {
        self.consume_next_input_character();
        match self.current_input_character {
            on_whitespace!() if self.is_appropriate_end_tag_token() => {
                self.switch_to(State::BeforeAttributeName);
            }
            on!('/') if self.is_appropriate_end_tag_token() => {
                self.switch_to(State::SelfClosingStartTag);
            }
            on!('>') if self.is_appropriate_end_tag_token() => {
                self.switch_to(State::Data);
                self.emit_current_token();
            }
            on_ascii_upper_alpha!(character) => {
                self.append_to_tag_name(character.to_ascii_lowercase());
                self.temporary_buffer.push(character);
            }
            on_ascii_lower_alpha!(character) => {
                self.append_to_tag_name(character);
                self.temporary_buffer.push(character);
            }
            _ => {
                self.current_token = None;
                self.emit_character('<');
                self.emit_character('/');
                let buffer = std::mem::take(&mut self.temporary_buffer);
                for character in buffer.chars() {
                    self.emit_character(character);
                }
                self.reconsume_in(text_state);
            }
        }
    }

    fn step(&mut self) {
        match self.state {
            // https://html.spec.whatwg.org/multipage/parsing.html#data-state
            State::Data | State::RcData => {
                let state = self.state;
                self.consume_next_input_character();
                match self.current_input_character {
                    on!('&') => {
                        self.return_state = Some(state);
                        self.switch_to(State::CharacterReference);
                    }
                    on!('<') if state == State::Data => self.switch_to(State::TagOpen),
                    on!('<') => self.switch_to(State::RcDataLessThanSign),
                    on_eof!() => self.emit_end_of_file(),
                    on_anything_else!(character) => self.emit_character(character),
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state
            State::RawText => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on!('<') => self.switch_to(State::RawTextLessThanSign),
                    on_eof!() => self.emit_end_of_file(),
                    on_anything_else!(character) => self.emit_character(character),
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state
            State::TagOpen => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on!('!') => self.switch_to(State::MarkupDeclarationOpen),
                    on!('/') => self.switch_to(State::EndTagOpen),
                    on_ascii_alpha!() => {
                        self.current_token = Some(Token::StartTag {
                            name: String::new(),
                            self_closing: false,
                            attributes: Vec::new(),
                        });
                        self.reconsume_in(State::TagName);
                    }
                    on!('?') => {
                        self.current_token = Some(Token::Comment {
                            data: String::new(),
                        });
                        self.reconsume_in(State::BogusComment);
                    }
                    on_eof!() => {
                        self.emit_character('<');
                        self.emit_end_of_file();
                    }
                    on_anything_else!() => {
                        self.emit_character('<');
                        self.reconsume_in(State::Data);
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state
            State::EndTagOpen => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_ascii_alpha!() => {
                        self.current_token = Some(Token::EndTag {
                            name: String::new(),
                        });
                        self.reconsume_in(State::TagName);
                    }
                    on!('>') => self.switch_to(State::Data),
                    on_eof!() => {
                        self.emit_character('<');
                        self.emit_character('/');
                        self.emit_end_of_file();
                    }
                    on_anything_else!() => {
                        self.current_token = Some(Token::Comment {
                            data: String::new(),
                        });
                        self.reconsume_in(State::BogusComment);
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state
            State::TagName => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_whitespace!() => self.switch_to(State::BeforeAttributeName),
                    on!('/') => self.switch_to(State::SelfClosingStartTag),
                    on!('>') => {
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    on_ascii_upper_alpha!(character) => {
                        self.append_to_tag_name(character.to_ascii_lowercase())
                    }
                    on_eof!() => self.emit_end_of_file(),
                    on_anything_else!(character) => self.append_to_tag_name(character),
                }
            }
            State::RcDataLessThanSign => {
                self.text_less_than_sign(State::RcData, State::RcDataEndTagOpen)
            }
            State::RcDataEndTagOpen => {
                self.text_end_tag_open(State::RcData, State::RcDataEndTagName)
            }
            State::RcDataEndTagName => self.text_end_tag_name(State::RcData),
            State::RawTextLessThanSign => {
                self.text_less_than_sign(State::RawText, State::RawTextEndTagOpen)
            }
            State::RawTextEndTagOpen => {
                self.text_end_tag_open(State::RawText, State::RawTextEndTagName)
            }
            State::RawTextEndTagName => self.text_end_tag_name(State::RawText),
            // https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state
            State::BeforeAttributeName => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_whitespace!() => {}
                    on!('/') | on!('>') | on_eof!() => self.reconsume_in(State::AfterAttributeName),
                    on!('=') => {
                        self.start_new_attribute(Attribute {
                            name: "=".to_string(),
                            value: String::new(),
                        });
                        self.switch_to(State::AttributeName);
                    }
                    on_anything_else!() => {
                        self.start_new_attribute(Attribute::empty());
                        self.reconsume_in(State::AttributeName);
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state
            State::AttributeName => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_whitespace!() | on!('/') | on!('>') | on_eof!() => {
                        self.reconsume_in(State::AfterAttributeName)
                    }
                    on!('=') => self.switch_to(State::BeforeAttributeValue),
                    on_ascii_upper_alpha!(character) => {
                        self.append_to_attribute_name(character.to_ascii_lowercase())
                    }
                    on_anything_else!(character) => self.append_to_attribute_name(character),
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state
            State::AfterAttributeName => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_whitespace!() => {}
                    on!('/') => self.switch_to(State::SelfClosingStartTag),
                    on!('=') => self.switch_to(State::BeforeAttributeValue),
                    on!('>') => {
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    on_eof!() => self.emit_end_of_file(),
                    on_anything_else!() => {
                        self.start_new_attribute(Attribute::empty());
                        self.reconsume_in(State::AttributeName);
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state
            State::BeforeAttributeValue => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_whitespace!() => {}
                    on!('"') => self.switch_to(State::AttributeValueDoubleQuoted),
                    on!('\'') => self.switch_to(State::AttributeValueSingleQuoted),
                    on!('>') => {
                        // missing-attribute-value parse error
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    _ => self.reconsume_in(State::AttributeValueUnquoted),
                }
            }
            State::AttributeValueDoubleQuoted | State::AttributeValueSingleQuoted => {
                let state = self.state;
                let quote = if state == State::AttributeValueDoubleQuoted {
                    '"'
                } else {
                    '\''
                };
                self.consume_next_input_character();
                match self.current_input_character {
                    Some(character) if character == quote => {
                        self.switch_to(State::AfterAttributeValueQuoted)
                    }
                    on!('&') => {
                        self.return_state = Some(state);
                        self.switch_to(State::CharacterReference);
                    }
                    on_eof!() => self.emit_end_of_file(),
                    on_anything_else!(character) => self.append_to_attribute_value(character),
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state
            State::AttributeValueUnquoted => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_whitespace!() => self.switch_to(State::BeforeAttributeName),
                    on!('&') => {
                        self.return_state = Some(State::AttributeValueUnquoted);
                        self.switch_to(State::CharacterReference);
                    }
                    on!('>') => {
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    on_eof!() => self.emit_end_of_file(),
                    on_anything_else!(character) => self.append_to_attribute_value(character),
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state
            State::AfterAttributeValueQuoted => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_whitespace!() => self.switch_to(State::BeforeAttributeName),
                    on!('/') => self.switch_to(State::SelfClosingStartTag),
                    on!('>') => {
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    on_eof!() => self.emit_end_of_file(),
                    on_anything_else!() => self.reconsume_in(State::BeforeAttributeName),
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state
            State::SelfClosingStartTag => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on!('>') => {
                        self.set_self_closing_flag();
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    on_eof!() => self.emit_end_of_file(),
                    on_anything_else!() => self.reconsume_in(State::BeforeAttributeName),
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state
            State::BogusComment => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on!('>') => {
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    on_eof!() => {
                        self.emit_current_token();
                        self.emit_end_of_file();
                    }
                    on_anything_else!(character) => {
                        self.append_to_comment(character.encode_utf8(&mut [0; 4]))
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state
            State::MarkupDeclarationOpen => {
                if self.next_characters_are("--", false) {
                    self.consume_characters("--");
                    self.current_token = Some(Token::Comment {
                        data: String::new(),
                    });
                    self.switch_to(State::CommentStart);
                } else if self.next_characters_are("DOCTYPE", true) {
                    self.consume_characters("DOCTYPE");
                    self.current_token = Some(Token::Doctype {
                        name: String::new(),
                    });
                    self.switch_to(State::Doctype);
                } else {
                    // incorrectly-opened-comment parse error
                    self.current_token = Some(Token::Comment {
                        data: String::new(),
                    });
                    self.switch_to(State::BogusComment);
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#comment-start-state
            State::CommentStart => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on!('-') => self.switch_to(State::CommentStartDash),
                    on!('>') => {
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    _ => self.reconsume_in(State::Comment),
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#comment-start-dash-state
            State::CommentStartDash => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on!('-') => self.switch_to(State::CommentEnd),
                    on!('>') => {
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    on_eof!() => {
                        self.emit_current_token();
                        self.emit_end_of_file();
                    }
                    on_anything_else!() => {
                        self.append_to_comment("-");
                        self.reconsume_in(State::Comment);
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#comment-state
            State::Comment => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on!('-') => self.switch_to(State::CommentEndDash),
                    on_eof!() => {
                        self.emit_current_token();
                        self.emit_end_of_file();
                    }
                    on_anything_else!(character) => {
                        self.append_to_comment(character.encode_utf8(&mut [0; 4]))
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#comment-end-dash-state
            State::CommentEndDash => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on!('-') => self.switch_to(State::CommentEnd),
                    on_eof!() => {
                        self.emit_current_token();
                        self.emit_end_of_file();
                    }
                    on_anything_else!() => {
                        self.append_to_comment("-");
                        self.reconsume_in(State::Comment);
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#comment-end-state
            State::CommentEnd => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on!('>') => {
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    on!('-') => self.append_to_comment("-"),
                    on_eof!() => {
                        self.emit_current_token();
                        self.emit_end_of_file();
                    }
                    on_anything_else!() => {
                        self.append_to_comment("--");
                        self.reconsume_in(State::Comment);
                    }
                }
            }
            // Doctypes carry no meaning inside a fragment, only the name is kept.
            State::Doctype => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_whitespace!() => {}
                    on!('>') => {
                        self.switch_to(State::Data);
                        self.emit_current_token();
                    }
                    on_eof!() => {
                        self.emit_current_token();
                        self.emit_end_of_file();
                    }
                    on_anything_else!(character) => {
                        self.append_to_doctype_name(character.to_ascii_lowercase())
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state
            State::CharacterReference => {
                self.temporary_buffer.clear();
                self.temporary_buffer.push('&');
                self.consume_next_input_character();
                match self.current_input_character {
                    on_ascii_alphanumeric!() => self.reconsume_in(State::NamedCharacterReference),
                    on!('#') => {
                        self.temporary_buffer.push('#');
                        self.switch_to(State::NumericCharacterReference);
                    }
                    _ => {
                        self.flush_code_points_consumed_as_a_character_reference();
                        self.reconsume_in_return_state();
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#named-character-reference-state
            State::NamedCharacterReference => {
                // Entered by reconsuming the first character of the name.
                self.consume_next_input_character();
                let start = self.position.saturating_sub(1);
                match longest_named_character_reference(&self.input[start..]) {
                    Some((length, characters)) => {
                        self.position = start + length;
                        self.temporary_buffer
                            .extend(&self.input[start..self.position]);

                        let historical = self.consumed_as_part_of_an_attribute()
                            && !self.temporary_buffer.ends_with(';')
                            && matches!(
                                self.input.get(self.position).copied(),
                                Some('=') | Some('0'..='9') | Some('a'..='z') | Some('A'..='Z')
                            );
                        if !historical {
                            // missing-semicolon-after-character-reference parse error when
                            // the name has no trailing semicolon
                            self.temporary_buffer = characters.to_string();
                        }
                        self.flush_code_points_consumed_as_a_character_reference();
                        self.switch_to_return_state();
                    }
                    None => {
                        // The unmatched name is plain text in the return state.
                        self.flush_code_points_consumed_as_a_character_reference();
                        self.reconsume_in_return_state();
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state
            State::NumericCharacterReference => {
                self.character_reference_code = 0;
                self.consume_next_input_character();
                match self.current_input_character {
                    Some(character @ 'x') | Some(character @ 'X') => {
                        self.temporary_buffer.push(character);
                        self.switch_to(State::HexadecimalCharacterReferenceStart);
                    }
                    _ => self.reconsume_in(State::DecimalCharacterReferenceStart),
                }
            }
            State::HexadecimalCharacterReferenceStart => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_ascii_hex_digit!() => self.reconsume_in(State::HexadecimalCharacterReference),
                    _ => {
                        // absence-of-digits-in-numeric-character-reference parse error
                        self.flush_code_points_consumed_as_a_character_reference();
                        self.reconsume_in_return_state();
                    }
                }
            }
            State::DecimalCharacterReferenceStart => {
                self.consume_next_input_character();
                match self.current_input_character {
                    on_ascii_digit!() => self.reconsume_in(State::DecimalCharacterReference),
                    _ => {
                        self.flush_code_points_consumed_as_a_character_reference();
                        self.reconsume_in_return_state();
                    }
                }
            }
            State::HexadecimalCharacterReference | State::DecimalCharacterReference => {
                let radix = if self.state == State::HexadecimalCharacterReference {
                    16
                } else {
                    10
                };
                self.consume_next_input_character();
                match self.current_input_character {
                    Some(character) if character.is_digit(radix) => {
                        let digit = character.to_digit(radix).unwrap_or_default();
                        self.character_reference_code = self
                            .character_reference_code
                            .saturating_mul(radix)
                            .saturating_add(digit);
                    }
                    on!(';') => self.switch_to(State::NumericCharacterReferenceEnd),
                    _ => {
                        // missing-semicolon-after-character-reference parse error
                        self.reconsume_in(State::NumericCharacterReferenceEnd);
                    }
                }
            }
            // https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state
            State::NumericCharacterReferenceEnd => {
                let character = match self.character_reference_code {
                    0x00 | 0xd800..=0xdfff | 0x110000.. => '\u{fffd}',
                    code => char::from_u32(code).unwrap_or('\u{fffd}'),
                };
                self.temporary_buffer.clear();
                self.temporary_buffer.push(character);
                self.flush_code_points_consumed_as_a_character_reference();
                self.switch_to_return_state();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(tokens: &[Token]) -> String {
        tokens
            .iter()
            .filter_map(|token| match token {
                Token::Character { data } => Some(*data),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_tag_with_attributes() {
        let tokens = Tokenizer::new(r#"<LINK rel="stylesheet" href='a.css' disabled data-x=1>"#)
            .tokenize();

        assert_eq!(
            tokens[0],
            Token::StartTag {
                name: "link".to_string(),
                self_closing: false,
                attributes: vec![
                    Attribute {
                        name: "rel".to_string(),
                        value: "stylesheet".to_string()
                    },
                    Attribute {
                        name: "href".to_string(),
                        value: "a.css".to_string()
                    },
                    Attribute {
                        name: "disabled".to_string(),
                        value: String::new()
                    },
                    Attribute {
                        name: "data-x".to_string(),
                        value: "1".to_string()
                    },
                ],
            }
        );
        assert_eq!(tokens[1], Token::EndOfFile);
    }

    #[test]
    fn duplicate_attributes_keep_the_first() {
        let tokens = Tokenizer::new(r#"<a id="one" id="two">"#).tokenize();
        let Token::StartTag { attributes, .. } = &tokens[0] else {
            panic!("expected a start tag, got {:?}", tokens[0]);
        };
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].value, "one");
    }

    #[test]
    fn self_closing_and_end_tags() {
        let tokens = Tokenizer::new("<br/></p>").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "br".to_string(),
                    self_closing: true,
                    attributes: vec![],
                },
                Token::EndTag {
                    name: "p".to_string()
                },
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn comments_and_doctype() {
        let tokens = Tokenizer::new("<!DOCTYPE html><!-- a - b --><?php ?>").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Doctype {
                    name: "html".to_string()
                },
                Token::Comment {
                    data: " a - b ".to_string()
                },
                Token::Comment {
                    data: "?php ?".to_string()
                },
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn character_references() {
        let tokens = Tokenizer::new("a &amp; b &lt;&#x41;&#66;&bogus; &").tokenize();
        assert_eq!(text(&tokens), "a & b <AB&bogus; &");
    }

    #[test]
    fn accented_and_legacy_character_references() {
        let tokens = Tokenizer::new("caf&eacute; &Auml; &copy 2024 &notit; &hellip").tokenize();
        assert_eq!(text(&tokens), "caf\u{e9} \u{c4} \u{a9} 2024 \u{ac}it; &hellip");
    }

    #[test]
    fn legacy_references_in_attributes_stay_literal_before_equals() {
        let tokens = Tokenizer::new(r#"<a href="?a=1&copy=2&not;x" title="&eacute">"#).tokenize();
        let Token::StartTag { attributes, .. } = &tokens[0] else {
            panic!("expected a start tag, got {:?}", tokens[0]);
        };
        assert_eq!(attributes[0].value, "?a=1&copy=2\u{ac}x");
        assert_eq!(attributes[1].value, "\u{e9}");
    }

    #[test]
    fn character_references_in_attribute_values() {
        let tokens = Tokenizer::new(r#"<a title="x &quot;y&quot;">"#).tokenize();
        let Token::StartTag { attributes, .. } = &tokens[0] else {
            panic!("expected a start tag, got {:?}", tokens[0]);
        };
        assert_eq!(attributes[0].value, "x \"y\"");
    }

    #[test]
    fn raw_text_runs_until_the_appropriate_end_tag() {
        let mut tokenizer = Tokenizer::new("<script>if (a < b) { x = '</p>'; }</script>after");
        let start = tokenizer.next_token();
        assert!(matches!(start, Some(Token::StartTag { ref name, .. }) if name == "script"));

        tokenizer.switch_to(State::RawText);
        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next_token() {
            tokens.push(token);
        }

        let end = tokens
            .iter()
            .position(|token| matches!(token, Token::EndTag { .. }))
            .unwrap();
        assert_eq!(text(&tokens[..end]), "if (a < b) { x = '</p>'; }");
        assert_eq!(
            tokens[end],
            Token::EndTag {
                name: "script".to_string()
            }
        );
        assert_eq!(text(&tokens[end..]), "after");
    }

    #[test]
    fn rcdata_decodes_references_but_not_tags() {
        let mut tokenizer = Tokenizer::new("<title>a <b> &amp; c</title>");
        tokenizer.next_token();
        tokenizer.switch_to(State::RcData);
        let tokens = tokenizer.tokenize();
        assert_eq!(text(&tokens), "a <b> & c");
    }
}
