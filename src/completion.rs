//! Shell completion scripts. Script names are completed at tab time by
//! calling back into `frun --list-names`, so they follow frecency order.

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

pub fn script(shell: Shell) -> &'static str {
    match shell {
        Shell::Bash => BASH,
        Shell::Zsh => ZSH,
        Shell::Fish => FISH,
    }
}

/// Where to put the generated script, printed to stderr next to it.
pub fn install_hint(shell: Shell) -> &'static str {
    match shell {
        Shell::Bash => {
            "# Install:\n#   frun --generate-completion bash > ~/.frun-completion.bash\n#   echo 'source ~/.frun-completion.bash' >> ~/.bashrc"
        }
        Shell::Zsh => {
            "# Install:\n#   frun --generate-completion zsh > ~/.zsh/completions/_frun\n#   fpath=(~/.zsh/completions $fpath)  # in ~/.zshrc, before compinit"
        }
        Shell::Fish => {
            "# Install:\n#   frun --generate-completion fish > ~/.config/fish/completions/frun.fish"
        }
    }
}

const BASH: &str = r#"# bash completion for frun

_frun() {
    local cur prev i
    cur="${COMP_WORDS[COMP_CWORD]}"
    prev="${COMP_WORDS[COMP_CWORD-1]}"

    # Everything after -- belongs to the script.
    for ((i = 1; i < COMP_CWORD; i++)); do
        [[ "${COMP_WORDS[i]}" == "--" ]] && return 0
    done

    case "$prev" in
        --generate-completion)
            COMPREPLY=($(compgen -W "bash zsh fish" -- "$cur"))
            return 0
            ;;
        --source)
            COMPREPLY=($(compgen -W "make npm pnpm yarn" -- "$cur"))
            return 0
            ;;
        --config)
            COMPREPLY=($(compgen -f -- "$cur"))
            return 0
            ;;
    esac

    if [[ "$cur" == -* ]]; then
        local flags="-l --last -s --search --list --list-names --pin --unpin --source
            --use-makefile --use-package-json --no-cache --reset --global-reset
            --generate-completion --config -h --help -V --version"
        COMPREPLY=($(compgen -W "$flags" -- "$cur"))
        return 0
    fi

    COMPREPLY=($(compgen -W "$(frun --list-names 2>/dev/null)" -- "$cur"))
}

complete -F _frun frun
"#;

const ZSH: &str = r#"#compdef frun

_frun_scripts() {
    local -a scripts
    scripts=(${(f)"$(frun --list-names 2>/dev/null)"})
    _describe 'script' scripts
}

_frun() {
    _arguments -s \
        '(- *)'{-h,--help}'[show help]' \
        '(- *)'{-V,--version}'[show version]' \
        '(-l --last)'{-l,--last}'[run the most frecent script]' \
        '(-s --search)'{-s,--search}'[filter scripts]:query:_frun_scripts' \
        '--list[list scripts with frecency]' \
        '--list-names[list script names]' \
        '--pin[pin a script]:script:_frun_scripts' \
        '--unpin[unpin a script]:script:_frun_scripts' \
        '--source[script source]:source:(make npm pnpm yarn)' \
        '(--use-package-json)--use-makefile[only Makefile targets]' \
        '(--use-makefile)--use-package-json[only package.json scripts]' \
        '--no-cache[re-detect the package manager]' \
        '--reset[clear history for this directory]' \
        '--global-reset[clear all history]' \
        '--generate-completion[print a completion script]:shell:(bash zsh fish)' \
        '--config[config file]:file:_files' \
        '*::script:_frun_scripts'
}

compdef _frun frun
"#;

const FISH: &str = r#"# fish completion for frun

function __frun_after_separator
    contains -- -- (commandline -opc)
end

complete -c frun -s h -l help -d 'Show help'
complete -c frun -s V -l version -d 'Show version'
complete -c frun -s l -l last -d 'Run the most frecent script'
complete -c frun -s s -l search -d 'Filter scripts' -x -a '(frun --list-names 2>/dev/null)'
complete -c frun -l list -d 'List scripts with frecency'
complete -c frun -l list-names -d 'List script names'
complete -c frun -l pin -d 'Pin a script' -x -a '(frun --list-names 2>/dev/null)'
complete -c frun -l unpin -d 'Unpin a script' -x -a '(frun --list-names 2>/dev/null)'
complete -c frun -l source -d 'Script source' -x -a 'make npm pnpm yarn'
complete -c frun -l use-makefile -d 'Only Makefile targets'
complete -c frun -l use-package-json -d 'Only package.json scripts'
complete -c frun -l no-cache -d 'Re-detect the package manager'
complete -c frun -l reset -d 'Clear history for this directory'
complete -c frun -l global-reset -d 'Clear all history'
complete -c frun -l generate-completion -d 'Print a completion script' -x -a 'bash zsh fish'
complete -c frun -l config -d 'Config file' -r -F
complete -c frun -f -n 'not __frun_after_separator' -a '(frun --list-names 2>/dev/null)'
"#;
