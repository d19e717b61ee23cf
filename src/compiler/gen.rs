use tracing::{debug, error};

use crate::{
    common::{escape::encode_string, source::Source},
    compiler::{
        lex::Lexer,
        read::Reader,
        syntax::Syntax,
        template::{Part, Template},
    },
    config::Config,
    vm::Renderer,
};

/// The name of the array output is collected in.
const OUTPUT: &str = "$output";
/// The name of the global that escapes expression values.
const ESCAPE: &str = "$escape";

/// Compiler lowers the parts of a template into a script,
/// one line per part, and reads that script into a renderer.
pub struct Compiler {
    lines: Vec<String>,
}

impl Compiler {
    pub fn base() -> Compiler {
        Compiler {
            lines: vec![format!("var {} = [];", OUTPUT)],
        }
    }

    /// Emits the line for a single part.
    pub fn part(&mut self, part: &Part) {
        let line = match part {
            Part::Content(text) => {
                format!("{}.push(\"{}\");", OUTPUT, encode_string(text))
            },
            Part::Code(code) => code.clone(),
            Part::Expression(expression) => {
                format!("{}.push({}({}));", OUTPUT, ESCAPE, expression)
            },
            Part::Comment(_) => return,
        };
        self.lines.push(line);
    }

    /// Closes the script, which returns what was collected.
    pub fn finish(mut self) -> String {
        self.lines.push(format!("return {}.join(\"\");", OUTPUT));
        self.lines.join("\n")
    }

    /// The script a template is lowered to.
    pub fn generate(template: &Template) -> String {
        let mut compiler = Compiler::base();
        for part in template.parts() {
            compiler.part(part);
        }
        compiler.finish()
    }

    /// Lowers a template and reads the resulting script.
    /// Code parts are spliced in verbatim, so mistakes in them only show
    /// up here; the failing script is logged for inspection.
    pub fn compile(template: &Template, config: &Config) -> Result<Renderer, Syntax> {
        let generated = Compiler::generate(template);
        let source = Source::generated(&generated);

        let program = Lexer::lex(source.clone())
            .and_then(|tokens| Reader::read(tokens, config.max_nesting));
        let program = match program {
            Ok(program) => program,
            Err(syntax) => {
                error!(source = %generated, reason = %syntax.reason, "generated script is invalid");
                return Err(syntax);
            },
        };

        debug!(length = generated.len(), "compiled template");
        Ok(Renderer::new(program, source, config.clone()))
    }
}
