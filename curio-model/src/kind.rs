//! Collection kinds and their built-in field sets.
//!
//! Field names here are the conventions fetchers and importers agree on
//! ("title", "author", "cr_year", "running-time", …) and must not change.

use crate::error::ModelError;
use crate::field::{Field, FieldFlags, FormatFlag};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of items a collection catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    Base,
    Book,
    Video,
    Album,
    Bibtex,
    #[serde(rename = "comic")]
    ComicBook,
    Wine,
    Coin,
    Stamp,
    Card,
    Game,
    File,
    #[serde(rename = "boardgame")]
    BoardGame,
}

impl CollectionType {
    pub const ALL: [CollectionType; 13] = [
        Self::Base,
        Self::Book,
        Self::Video,
        Self::Album,
        Self::Bibtex,
        Self::ComicBook,
        Self::Wine,
        Self::Coin,
        Self::Stamp,
        Self::Card,
        Self::Game,
        Self::File,
        Self::BoardGame,
    ];

    /// Numeric code used by the XML exchange format.
    pub const fn code(self) -> u8 {
        match self {
            Self::Base => 1,
            Self::Book => 2,
            Self::Video => 3,
            Self::Album => 4,
            Self::Bibtex => 5,
            Self::ComicBook => 6,
            Self::Wine => 7,
            Self::Coin => 8,
            Self::Stamp => 9,
            Self::Card => 10,
            Self::Game => 11,
            Self::File => 12,
            Self::BoardGame => 13,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Book => "book",
            Self::Video => "video",
            Self::Album => "album",
            Self::Bibtex => "bibtex",
            Self::ComicBook => "comic",
            Self::Wine => "wine",
            Self::Coin => "coin",
            Self::Stamp => "stamp",
            Self::Card => "card",
            Self::Game => "game",
            Self::File => "file",
            Self::BoardGame => "boardgame",
        }
    }

    pub const fn default_title(self) -> &'static str {
        match self {
            Self::Base => "My Collection",
            Self::Book => "My Books",
            Self::Video => "My Videos",
            Self::Album => "My Music",
            Self::Bibtex => "Bibliography",
            Self::ComicBook => "My Comic Books",
            Self::Wine => "My Wines",
            Self::Coin => "My Coins",
            Self::Stamp => "My Stamps",
            Self::Card => "My Cards",
            Self::Game => "My Games",
            Self::File => "My Files",
            Self::BoardGame => "My Board Games",
        }
    }

    /// The built-in fields of this kind.
    pub fn default_fields(self) -> Vec<Field> {
        let mut fields = vec![title()];
        match self {
            Self::Base => {}
            Self::Book => fields.extend([
                Field::line("subtitle", "Subtitle").with_format(FormatFlag::Title),
                person("author", "Author"),
                person("editor", "Editor"),
                company("publisher", "Publisher"),
                Field::line("edition", "Edition").with_flags(FieldFlags::ALLOW_COMPLETION),
                year("cr_year", "Copyright Year"),
                year("pub_year", "Publication Year"),
                Field::line("isbn", "ISBN#"),
                Field::line("lccn", "LCCN#"),
                Field::number("pages", "Pages"),
                Field::choice(
                    "binding",
                    "Binding",
                    &["Hardback", "Paperback", "Trade Paperback", "E-Book", "Magazine", "Journal"],
                )
                .with_flags(FieldFlags::ALLOW_GROUPED),
                list("language", "Language"),
                list("genre", "Genre"),
                list("keyword", "Keywords"),
                Field::line("series", "Series").with_format(FormatFlag::Title),
                Field::image("cover", "Front Cover"),
                Field::para("plot", "Plot Summary"),
                Field::bool("read", "Read"),
                Field::para("comments", "Comments"),
            ]),
            Self::Video => fields.extend([
                Field::choice(
                    "medium",
                    "Medium",
                    &["DVD", "VHS", "Blu-ray", "HD DVD", "Laserdisc", "VCD"],
                )
                .with_flags(FieldFlags::ALLOW_GROUPED),
                year("year", "Production Year"),
                Field::line("certification", "Certification")
                    .with_flags(FieldFlags::ALLOW_GROUPED),
                list("genre", "Genre"),
                list("nationality", "Nationality"),
                list("language", "Language"),
                person("director", "Director"),
                person("producer", "Producer"),
                person("writer", "Writer"),
                person("composer", "Composer"),
                Field::table("cast", "Cast").with_flags(FieldFlags::ALLOW_GROUPED),
                company("studio", "Studio"),
                Field::number("running-time", "Running Time"),
                Field::url("url", "URL"),
                Field::image("cover", "Cover"),
                Field::para("plot", "Plot Summary"),
                Field::para("comments", "Comments"),
            ]),
            Self::Album => fields.extend([
                Field::choice("medium", "Medium", &["Compact Disc", "DVD", "Cassette", "Vinyl"])
                    .with_flags(FieldFlags::ALLOW_GROUPED),
                list("artist", "Artist"),
                company("label", "Label"),
                year("year", "Year"),
                list("genre", "Genre"),
                Field::table("track", "Tracks"),
                Field::image("cover", "Cover"),
                Field::para("comments", "Comments"),
            ]),
            Self::Bibtex => fields.extend([
                Field::choice(
                    "entry-type",
                    "Entry Type",
                    &[
                        "article", "book", "booklet", "inbook", "incollection",
                        "inproceedings", "manual", "mastersthesis", "misc", "phdthesis",
                        "proceedings", "techreport", "unpublished",
                    ],
                )
                .with_flags(FieldFlags::ALLOW_GROUPED)
                .with_property("bibtex", "entry-type"),
                person("author", "Author").with_property("bibtex", "author"),
                Field::line("bibtex-key", "Bibtex Key").with_property("bibtex", "key"),
                Field::line("booktitle", "Book Title")
                    .with_format(FormatFlag::Title)
                    .with_property("bibtex", "booktitle"),
                person("editor", "Editor").with_property("bibtex", "editor"),
                company("organization", "Organization").with_property("bibtex", "organization"),
                company("journal", "Journal").with_property("bibtex", "journal"),
                Field::line("address", "Address").with_property("bibtex", "address"),
                Field::line("edition", "Edition").with_property("bibtex", "edition"),
                Field::line("pages", "Pages").with_property("bibtex", "pages"),
                year("year", "Year").with_property("bibtex", "year"),
                Field::line("isbn", "ISBN#").with_property("bibtex", "isbn"),
                company("publisher", "Publisher").with_property("bibtex", "publisher"),
                company("school", "School").with_property("bibtex", "school"),
                company("institution", "Institution").with_property("bibtex", "institution"),
                list("keyword", "Keywords").with_property("bibtex", "keywords"),
                Field::url("url", "URL").with_property("bibtex", "url"),
                Field::line("doi", "DOI").with_property("bibtex", "doi"),
                Field::para("note", "Notes").with_property("bibtex", "note"),
                Field::para("abstract", "Abstract").with_property("bibtex", "abstract"),
            ]),
            Self::ComicBook => fields.extend([
                Field::line("subtitle", "Subtitle").with_format(FormatFlag::Title),
                person("writer", "Writer"),
                person("artist", "Comic Artist"),
                Field::line("series", "Series")
                    .with_format(FormatFlag::Title)
                    .with_flags(FieldFlags::ALLOW_GROUPED),
                Field::number("issue", "Issue"),
                company("publisher", "Publisher"),
                year("pub_year", "Publication Year"),
                list("genre", "Genre"),
                Field::image("cover", "Front Cover"),
            ]),
            Self::Wine => fields.extend([
                company("producer", "Producer"),
                company("appellation", "Appellation"),
                list("varietal", "Varietal"),
                year("vintage", "Vintage"),
                Field::choice("type", "Type", &["Red Wine", "White Wine", "Sparkling Wine"])
                    .with_flags(FieldFlags::ALLOW_GROUPED),
                list("country", "Country"),
            ]),
            Self::Coin => fields.extend([
                Field::line("type", "Type").with_flags(FieldFlags::ALLOW_GROUPED),
                Field::line("denomination", "Denomination").with_flags(FieldFlags::ALLOW_GROUPED),
                year("year", "Year"),
                Field::line("mintmark", "Mint Mark").with_flags(FieldFlags::ALLOW_GROUPED),
                list("country", "Country"),
            ]),
            Self::Stamp => fields.extend([
                Field::line("description", "Description"),
                Field::line("denomination", "Denomination").with_flags(FieldFlags::ALLOW_GROUPED),
                list("country", "Country"),
                year("year", "Issue Year"),
            ]),
            Self::Card => fields.extend([
                person("player", "Player"),
                company("team", "Team"),
                company("brand", "Brand"),
                year("year", "Year"),
            ]),
            Self::Game => fields.extend([
                Field::line("platform", "Platform").with_flags(FieldFlags::ALLOW_GROUPED),
                list("genre", "Genre"),
                year("year", "Release Year"),
                company("publisher", "Publisher"),
                company("developer", "Developer"),
                Field::image("cover", "Cover"),
            ]),
            Self::File => fields.extend([
                Field::url("url", "URL").with_property("relative", "false"),
                Field::line("description", "Description"),
                Field::line("volume", "Volume").with_flags(FieldFlags::ALLOW_GROUPED),
                Field::line("folder", "Folder").with_flags(FieldFlags::ALLOW_GROUPED),
                Field::line("mimetype", "Mimetype").with_flags(FieldFlags::ALLOW_GROUPED),
                Field::number("size", "Size"),
                Field::line("permissions", "Permissions"),
                Field::line("owner", "Owner").with_flags(FieldFlags::ALLOW_GROUPED),
                Field::line("group", "Group").with_flags(FieldFlags::ALLOW_GROUPED),
                Field::date("created", "Created"),
                Field::date("modified", "Modified"),
                Field::table("metainfo", "Meta Info"),
                Field::image("icon", "Icon"),
            ]),
            Self::BoardGame => fields.extend([
                list("genre", "Genre"),
                list("mechanism", "Mechanism"),
                year("year", "Release Year"),
                company("publisher", "Publisher"),
                person("designer", "Designer"),
                Field::line("num-player", "Number of Players"),
                Field::image("cover", "Cover"),
            ]),
        }
        fields
    }
}

fn title() -> Field {
    Field::line("title", "Title")
        .with_category("General")
        .with_flags(FieldFlags::NO_DELETE)
        .with_format(FormatFlag::Title)
}

fn person(name: &str, title: &str) -> Field {
    Field::line(name, title)
        .with_category("General")
        .with_flags(
            FieldFlags::ALLOW_MULTIPLE | FieldFlags::ALLOW_GROUPED | FieldFlags::ALLOW_COMPLETION,
        )
        .with_format(FormatFlag::Name)
}

fn company(name: &str, title: &str) -> Field {
    Field::line(name, title)
        .with_category("Publishing")
        .with_flags(FieldFlags::ALLOW_GROUPED | FieldFlags::ALLOW_COMPLETION)
        .with_format(FormatFlag::Plain)
}

fn list(name: &str, title: &str) -> Field {
    Field::line(name, title)
        .with_category("Classification")
        .with_flags(
            FieldFlags::ALLOW_MULTIPLE | FieldFlags::ALLOW_GROUPED | FieldFlags::ALLOW_COMPLETION,
        )
        .with_format(FormatFlag::Plain)
}

fn year(name: &str, title: &str) -> Field {
    Field::number(name, title)
        .with_category("Publishing")
        .with_flags(FieldFlags::ALLOW_GROUPED)
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectionType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code)
                .ok_or_else(|| ModelError::UnknownCollectionType(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownCollectionType(s.to_string()))
    }
}
