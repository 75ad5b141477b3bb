// src/prompt/locale.rs
//! Instruction text renderings.
//!
//! Every locale carries the same blocks; the compiler decides which blocks
//! appear, so switching locale never changes the structure of a request.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "sr")]
    Serbian,
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::English => write!(f, "en"),
            Locale::Serbian => write!(f, "sr"),
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "sr" | "serbian" | "srpski" => Ok(Locale::Serbian),
            _ => Err(format!("Unknown locale: {} (expected en or sr)", s)),
        }
    }
}

/// The fixed text blocks of one rendering.
pub struct Texts {
    pub goal: &'static str,
    pub fields: &'static str,
    pub interactions: &'static str,
    pub extras: &'static str,
    pub output_contract: &'static str,
    pub revise_goal: &'static str,
    pub revise_contract: &'static str,
    pub vision_framing: &'static str,
    pub vision_prompt: &'static str,
    pub missing_fields_warning: &'static str,
}

impl Locale {
    pub fn texts(self) -> &'static Texts {
        match self {
            Locale::English => &ENGLISH,
            Locale::Serbian => &SERBIAN,
        }
    }
}

static ENGLISH: Texts = Texts {
    goal: r#"<goal>
Generate a single self-contained ".html" document that is a complete interactive educational tool.
The document must embed its CSS and JavaScript; include the p5.js or d3.js library when it helps.
The tool must show the educational concept described by the input visually and interactively, driving object behavior with IF-THEN logic.
The initial view clearly shows the title, the description and the starting state of the elements; user clicks trigger the matching reactions.
The output must be one working ".html" file that opens directly in a web browser with no further setup.
</goal>"#,
    fields: r#"<instruction>
Handle every key of the JSON input according to the following meaning:

- "title": The name of the interactive tool. Use it as the main page heading (for example inside an "<h1>" tag), visible at the top of the tool. It must clearly identify the topic or purpose of the tool.

- "audience": Who the tool is meant for (for example primary school pupils, students, teachers). This is metadata and must not be shown in the user interface; you may include it as an HTML comment for developers.

- "description": A textual description of the educational concept the tool illustrates. Show it as a paragraph (for example inside "<p>") below the title, as an introduction to the tool. It must be easy to read and explain the purpose of the tool.

- "initial": The initial visual state of the objects on screen: their positions, shapes, sizes, colors and layout. Build the initial view from it using an HTML canvas, SVG, or libraries such as p5.js or D3.js. This is the scene the user sees before interacting.
</instruction>"#,
    interactions: r#"<interactions>
- "interactions": A list of rules defining how objects react to user actions. Every rule contains the following fields:
  - "if": The condition that activates the rule (for example a click on a given object or position).
  - "then_first": The action performed the first time the condition is met (for example a color change or a text appearing).
  - "then_next": A list of actions performed in order on every following activation of the same condition.
  - "position": The starting position of the object on screen, usually as (x, y) coordinates. Use it to place interactive elements precisely.
  - "style": Styling of the object: visual properties such as color, border, shape and size. Use it for the initial rendering of the object.

Implement a mechanism that detects clicks and counts clicks per object so behavior advances correctly through the "then_first" and "then_next" sequences.
</interactions>"#,
    extras: r#"<extras>
- "extras": Optional additional features such as animations, extra visualizations, appearing text, audio effects and so on. Add them on top of the basic behaviors, consistent with the meaning of the given descriptions.
</extras>"#,
    output_contract: r#"<output>
Finally, generate one ".html" document containing everything required (HTML, embedded CSS, embedded JavaScript), fully functional and ready to open locally in a browser.
Do not add any comments, introductory sentences, explanations or text outside the HTML code. The output must contain exactly one valid HTML document with no header, preamble or interpretation.
</output>"#,
    revise_goal: r#"<goal>
You are editing an existing self-contained interactive educational ".html" document.
Keep its structure, styling and behavior exactly as they are, except where the instruction below requires a change.
Apply the instruction to the document provided after it and return the complete updated document.
</goal>"#,
    revise_contract: r#"<output>
Return exactly one complete, valid HTML document. Do not add comments, explanations, introductory sentences or any text outside the HTML code.
</output>"#,
    vision_framing: "You describe images so they can be recreated as the starting scene of an interactive educational tool.",
    vision_prompt: "Describe the scene in this image as one paragraph: every visible object with its position, shape, size and color, and how the objects are arranged relative to each other.",
    missing_fields_warning: "Fill in all required fields!",
};

static SERBIAN: Texts = Texts {
    goal: r#"<goal>
Generiši jedan samostalan ".html" dokument koji predstavlja kompletan interaktivni obrazovni alat.
Dokument mora imati ugrađen CSS i JavaScript kod, uključi p5.js ili d3.js biblioteke po potrebi.
Alat treba da vizuelno i interaktivno prikazuje obrazovni koncept opisan kroz ulazne podatke, koristeći IF-THEN logiku ponašanja objekata.
U početnom prikazu se jasno vidi naslov, opis i početno stanje elemenata, a korisničke interakcije kroz klikove pokreću odgovarajuće reakcije.
Izlaz mora biti jedan funkcionalan ".html" fajl, spreman za direktno pokretanje u web pregledaču bez dodatnih podešavanja.
</goal>"#,
    fields: r#"<instruction>
Obradi svaki ključ iz JSON ulaza prema sledećem značenju i uputstvu:

- "title": Predstavlja naziv interaktivnog alata. Ovaj tekst koristi kao glavni naslov stranice (npr. unutar "<h1>" taga), vidljivo prikazan na vrhu alata. Treba jasno da identifikuje temu ili funkcionalnost alata.

- "audience": Opis ciljne grupe kojoj je alat namenjen (npr. osnovnoškolci, studenti, nastavnici). Ova informacija je meta-podatak i nije namenjena za prikaz u korisničkom interfejsu, ali je možeš uključiti kao komentar u HTML kodu radi orijentacije programera.

- "description": Tekstualni opis obrazovnog koncepta koji alat ilustruje. Ovaj sadržaj prikaži kao paragraf (npr. unutar "<p>") ispod naslova, kao uvod u alat. Treba da bude lako čitljiv i jasno objašnjava svrhu i funkciju alata.

- "initial": Definiše početno vizuelno stanje objekata na ekranu: njihove pozicije, oblike, veličine, boje i raspored. Na osnovu ovog opisa generiši početni prikaz koristeći HTML canvas, SVG, ili biblioteke poput p5.js ili D3.js. Ovo je početna scena koju korisnik vidi pre nego što započne interakciju.
</instruction>"#,
    interactions: r#"<interactions>
- "interactions": Niz pravila koja definišu kako objekti reaguju na korisničke akcije. Svako pravilo sadrži sledeća polja:
  - "if": Uslov koji aktivira pravilo (npr. klik na određeni objekat ili poziciju).
  - "then_first": Akcija koja se izvršava pri prvom ispunjenju uslova (npr. promena boje, prikaz teksta).
  - "then_next": Lista akcija koje se izvršavaju redosledno pri svakom sledećem aktiviranju istog uslova.
  - "position": Početna pozicija objekta na ekranu, obično u koordinatama (x, y). Koristi se za precizno postavljanje interaktivnih elemenata.
  - "style": Stilizacija objekta: vizuelne osobine poput boje, ivica, oblika i veličine. Koristi se za inicijalno renderovanje objekta.

Implementiraj mehanizam koji detektuje klikove i prati broj klikova po objektu kako bi pravilno menjao ponašanje kroz "then_first" i "then_next" sekvence.
</interactions>"#,
    extras: r#"<extras>
- "extras": Opcionalno polje sa dodatnim funkcionalnostima kao što su animacije, dodatne vizualizacije, pojavljivanje teksta, audio efekti, itd. Uključi ih kao dopune osnovnim ponašanjima, u skladu sa semantikom datih opisa.
</extras>"#,
    output_contract: r#"<output>
Na kraju, generiši jedan ".html" dokument koji uključuje sve potrebne elemente (HTML, ugrađeni CSS, ugrađeni JavaScript), potpuno funkcionalan i spreman za lokalno otvaranje u pregledaču.
Ne dodaj nikakve dodatne komentare, uvodne rečenice, objašnjenja ili tekst izvan HTML koda. Output mora sadržati isključivo jedan validan HTML dokument bez ikakvog zaglavlja, uvoda ili tumačenja.
</output>"#,
    revise_goal: r#"<goal>
Menjaš postojeći samostalan interaktivni obrazovni ".html" dokument.
Zadrži njegovu strukturu, stilove i ponašanje tačno onakvim kakvi jesu, osim tamo gde uputstvo ispod zahteva promenu.
Primeni uputstvo na dokument koji sledi posle njega i vrati kompletan izmenjen dokument.
</goal>"#,
    revise_contract: r#"<output>
Vrati tačno jedan kompletan, validan HTML dokument. Ne dodaj komentare, objašnjenja, uvodne rečenice niti bilo kakav tekst izvan HTML koda.
</output>"#,
    vision_framing: "Opisuješ slike tako da se mogu rekreirati kao početna scena interaktivnog obrazovnog alata.",
    vision_prompt: "Opiši scenu sa ove slike u jednom paragrafu: svaki vidljiv objekat sa njegovom pozicijom, oblikom, veličinom i bojom, i kako su objekti raspoređeni jedni u odnosu na druge.",
    missing_fields_warning: "Popuni sva obavezna polja!",
};
