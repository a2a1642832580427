//! Natural-language task text sent to the agent

use crate::config::SpeechConfig;

/// What the agent has to do on the text-to-speech page
#[derive(Clone, Debug)]
pub struct SpeechTask<'a> {
    /// Page to open
    pub app_url: &'a str,
    /// Account email used if the page asks for a login
    pub email: &'a str,
    /// Account password used if the page asks for a login
    pub password: &'a str,
    /// Voice to select before generating, if any
    pub voice_id: Option<&'a str>,
    /// Script pasted verbatim into the editor
    pub script: &'a str,
}

impl<'a> SpeechTask<'a> {
    /// Borrow page and credentials from the speech configuration
    ///
    /// Returns `None` when the account credentials are missing.
    pub fn from_config(config: &'a SpeechConfig, voice_id: Option<&'a str>, script: &'a str) -> Option<Self> {
        Some(Self {
            app_url: &config.app_url,
            email: config.email.as_deref()?,
            password: config.password.as_ref()?.expose(),
            voice_id,
            script,
        })
    }

    /// Render the instructions
    ///
    /// The agent is told not to download anything: the audio is recovered
    /// afterwards from the speech service's history.
    pub fn render(&self) -> String {
        let voice_selection = match self.voice_id {
            Some(voice) => format!(
                "first, click on the voice dropdown and select the voice with ID '{voice}', \
                 wait for the voice to be selected, then "
            ),
            None => String::new(),
        };

        format!(
            "Go to {app_url}, \
             if redirected to login or signup, log in using email: {email} and password: {password}, \
             after successful login, go to the text-to-speech section, \
             {voice_selection}\
             paste the following script EXACTLY as provided into the text input area \
             (do not modify, shorten, or change the script in any way): \"{script}\", \
             click the 'Enhance (alpha)' button, \
             wait for the enhanced script to appear in the text area, \
             verify that the enhanced script contains the full original content, \
             click the 'Generate speech' button, \
             wait for the audio to be generated, \
             do not download or fetch the audio file yet.",
            app_url = self.app_url,
            email = self.email,
            password = self.password,
            script = self.script,
        )
    }
}
